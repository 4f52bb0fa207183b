//! JSON document collections persisted as raw objects in the blob store.
//!
//! Each logical collection ("products", "receipts", "settings") is one
//! JSON object under the `documents` folder, read and rewritten whole on
//! every mutation. There is no locking or version check: concurrent
//! writers to the same name race and the last `save` wins.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{AssetKind, BlobStore, BlobStoreError, DOCUMENTS_FOLDER, UploadOptions};

/// Errors from document load/save.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// Underlying blob store failure.
    #[error("store error: {0}")]
    Store(#[from] BlobStoreError),

    /// The stored object is not valid JSON for the expected shape.
    #[error("malformed document {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be serialized.
    #[error("serialize {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load/ensure/save access to named JSON documents.
#[derive(Clone)]
pub struct DocumentStore {
    blobs: Arc<dyn BlobStore>,
}

impl DocumentStore {
    /// Create a store on top of a blob backend.
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    fn asset_id(name: &str) -> String {
        format!("{DOCUMENTS_FOLDER}/{name}")
    }

    /// Load a document by name. Absent documents are `None`, not an error.
    ///
    /// # Errors
    ///
    /// Fails on blob store I/O errors or when the stored bytes do not
    /// deserialize as `T`.
    pub async fn load<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, DocumentStoreError> {
        match self.blobs.fetch(&Self::asset_id(name), AssetKind::Raw).await {
            Ok(bytes) => {
                let value =
                    serde_json::from_slice(&bytes).map_err(|source| DocumentStoreError::Malformed {
                        name: name.to_string(),
                        source,
                    })?;
                Ok(Some(value))
            }
            Err(BlobStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a document, writing and returning `default` when absent.
    ///
    /// The read and the fallback write are separate round trips; two
    /// concurrent first accesses can both observe absence and one write
    /// wins. Accepted limitation.
    ///
    /// # Errors
    ///
    /// Fails on blob store I/O or (de)serialization errors.
    pub async fn ensure<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
        default: T,
    ) -> Result<T, DocumentStoreError> {
        if let Some(existing) = self.load(name).await? {
            return Ok(existing);
        }
        self.save(name, &default).await?;
        Ok(default)
    }

    /// Serialize and store a document, overwriting any prior version.
    ///
    /// # Errors
    ///
    /// Fails on serialization or blob store I/O errors.
    pub async fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), DocumentStoreError> {
        let bytes =
            serde_json::to_vec(value).map_err(|source| DocumentStoreError::Serialize {
                name: name.to_string(),
                source,
            })?;

        self.blobs
            .upload(
                bytes,
                UploadOptions {
                    folder: DOCUMENTS_FOLDER,
                    public_id: name,
                    overwrite: true,
                    allowed_formats: &[],
                    kind: AssetKind::Raw,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::super::MemoryBlobStore;
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Entry {
        id: i64,
        name: String,
    }

    fn store_pair() -> (Arc<MemoryBlobStore>, DocumentStore) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let documents = DocumentStore::new(blobs.clone());
        (blobs, documents)
    }

    #[tokio::test]
    async fn test_load_absent_is_none() {
        let (_, documents) = store_pair();
        let loaded: Option<Vec<Entry>> = documents.load("products").await.expect("load");
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let (_, documents) = store_pair();
        let entries = vec![
            Entry {
                id: 1,
                name: "coffee".to_string(),
            },
            Entry {
                id: 2,
                name: "tea".to_string(),
            },
        ];

        documents.save("products", &entries).await.expect("save");
        let loaded: Vec<Entry> = documents
            .load("products")
            .await
            .expect("load")
            .expect("present");
        assert_eq!(loaded, entries);
    }

    #[tokio::test]
    async fn test_ensure_writes_default_once() {
        let (blobs, documents) = store_pair();

        let first: Vec<Entry> = documents.ensure("receipts", Vec::new()).await.expect("ensure");
        assert!(first.is_empty());
        assert_eq!(blobs.upload_count(), 1);

        // Second ensure reads the stored default; no further write.
        let second: Vec<Entry> = documents.ensure("receipts", Vec::new()).await.expect("ensure");
        assert!(second.is_empty());
        assert_eq!(blobs.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_ensure_does_not_clobber_existing() {
        let (_, documents) = store_pair();
        let entries = vec![Entry {
            id: 7,
            name: "soap".to_string(),
        }];
        documents.save("products", &entries).await.expect("save");

        let ensured: Vec<Entry> = documents
            .ensure("products", Vec::new())
            .await
            .expect("ensure");
        assert_eq!(ensured, entries);
    }

    #[tokio::test]
    async fn test_documents_are_namespaced() {
        let (blobs, documents) = store_pair();
        documents
            .save("settings", &Entry {
                id: 0,
                name: String::new(),
            })
            .await
            .expect("save");
        assert!(blobs.contains("documents/settings"));
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let (blobs, documents) = store_pair();
        blobs
            .upload(
                b"not json".to_vec(),
                UploadOptions {
                    folder: DOCUMENTS_FOLDER,
                    public_id: "products",
                    overwrite: true,
                    allowed_formats: &[],
                    kind: AssetKind::Raw,
                },
            )
            .await
            .expect("seed");

        let result: Result<Option<Vec<Entry>>, _> = documents.load("products").await;
        assert!(matches!(
            result,
            Err(DocumentStoreError::Malformed { .. })
        ));
    }
}
