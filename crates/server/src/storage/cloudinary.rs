//! Cloudinary-backed [`BlobStore`] implementation.
//!
//! Uploads go through the authenticated upload API with a SHA-1 request
//! signature; deletes go through `destroy`; fetches read the public
//! delivery URL. Credentials come from [`CloudinaryConfig`].

use std::sync::Arc;

use secrecy::ExposeSecret;
use sha1::{Digest, Sha1};

use super::{AssetKind, BlobStore, BlobStoreError, UploadOptions, UploadedAsset};
use crate::config::CloudinaryConfig;

/// Authenticated API base URL.
const API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Public delivery base URL.
const DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Cloudinary object store client.
///
/// Cheaply cloneable; the HTTP client and credentials live behind an `Arc`.
#[derive(Clone)]
pub struct CloudinaryStore {
    inner: Arc<CloudinaryStoreInner>,
}

struct CloudinaryStoreInner {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, serde::Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, serde::Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorMessage {
    message: String,
}

impl CloudinaryStore {
    /// Create a new client from credentials.
    #[must_use]
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            inner: Arc::new(CloudinaryStoreInner {
                client: reqwest::Client::new(),
                config,
            }),
        }
    }

    fn endpoint(&self, kind: AssetKind, action: &str) -> String {
        format!(
            "{API_BASE_URL}/{}/{}/{action}",
            self.inner.config.cloud_name,
            kind.as_str()
        )
    }

    /// Sign request parameters: SHA-1 hex over the alphabetically sorted
    /// `key=value` pairs joined by `&`, with the API secret appended.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign: Vec<String> = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();

        let mut hasher = Sha1::new();
        hasher.update(to_sign.join("&"));
        hasher.update(self.inner.config.api_secret.expose_secret());
        hex::encode(hasher.finalize())
    }

    async fn parse_api_error(response: reqwest::Response) -> BlobStoreError {
        let status = response.status();
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("status {status}"),
        };

        if status.as_u16() == 400 {
            BlobStoreError::UploadRejected(message)
        } else {
            BlobStoreError::Provider(message)
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for CloudinaryStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadedAsset, BlobStoreError> {
        let public_id = options.qualified_id();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, String)> = vec![
            ("overwrite", options.overwrite.to_string()),
            ("public_id", public_id),
            ("timestamp", timestamp),
        ];
        if !options.allowed_formats.is_empty() {
            signed.push(("allowed_formats", options.allowed_formats.join(",")));
        }
        let signature = self.sign(&signed);

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(content))
            .text("api_key", self.inner.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let response = self
            .inner
            .client
            .post(self.endpoint(options.kind, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_api_error(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| BlobStoreError::Provider(format!("malformed upload response: {e}")))?;

        Ok(UploadedAsset {
            url: body.secure_url,
            asset_id: body.public_id,
        })
    }

    async fn fetch(&self, asset_id: &str, kind: AssetKind) -> Result<Vec<u8>, BlobStoreError> {
        let url = format!(
            "{DELIVERY_BASE_URL}/{}/{}/upload/{asset_id}",
            self.inner.config.cloud_name,
            kind.as_str()
        );

        let response = self.inner.client.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Err(BlobStoreError::NotFound(asset_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(BlobStoreError::Provider(format!(
                "fetch of {asset_id} returned status {}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn delete(&self, asset_id: &str, kind: AssetKind) -> Result<(), BlobStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signed: Vec<(&str, String)> = vec![
            ("public_id", asset_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = self.sign(&signed);

        let response = self
            .inner
            .client
            .post(self.endpoint(kind, "destroy"))
            .form(&[
                ("public_id", asset_id),
                ("timestamp", &timestamp),
                ("api_key", &self.inner.config.api_key),
                ("signature", &signature),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::parse_api_error(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| BlobStoreError::Provider(format!("malformed destroy response: {e}")))?;

        // "not found" counts as success: the object is gone either way.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(BlobStoreError::Provider(format!(
                "destroy of {asset_id} returned: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_store() -> CloudinaryStore {
        CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "123456789".to_string(),
            api_secret: SecretString::from("abcd1234"),
        })
    }

    #[test]
    fn test_signature_is_sorted_and_stable() {
        let store = test_store();
        let forward = store.sign(&[
            ("public_id", "products/1".to_string()),
            ("timestamp", "1700000000".to_string()),
        ]);
        let reversed = store.sign(&[
            ("timestamp", "1700000000".to_string()),
            ("public_id", "products/1".to_string()),
        ]);
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 40); // SHA-1 hex digest
    }

    #[test]
    fn test_signature_matches_known_digest() {
        let store = test_store();
        let signature = store.sign(&[
            ("public_id", "products/1".to_string()),
            ("timestamp", "1700000000".to_string()),
        ]);

        let mut hasher = Sha1::new();
        hasher.update("public_id=products/1&timestamp=1700000000abcd1234");
        assert_eq!(signature, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_endpoint_uses_resource_type() {
        let store = test_store();
        assert_eq!(
            store.endpoint(AssetKind::Raw, "upload"),
            "https://api.cloudinary.com/v1_1/demo/raw/upload"
        );
        assert_eq!(
            store.endpoint(AssetKind::Image, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }
}
