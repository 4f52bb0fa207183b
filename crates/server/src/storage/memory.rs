//! In-memory [`BlobStore`] used by tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{AssetKind, BlobStore, BlobStoreError, UploadOptions, UploadedAsset};

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    kind: AssetKind,
}

/// A blob store backed by a process-local map.
///
/// Beyond the [`BlobStore`] contract it records upload counts and can be
/// switched to fail deletes, which tests use to exercise the best-effort
/// delete paths.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    uploads: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `delete` call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Total number of uploads performed.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Whether an object exists under `asset_id`.
    pub fn contains(&self, asset_id: &str) -> bool {
        self.lock().contains_key(asset_id)
    }

    /// Raw content of an object, if present.
    pub fn object(&self, asset_id: &str) -> Option<Vec<u8>> {
        self.lock().get(asset_id).map(|stored| stored.content.clone())
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned; acceptable in a
    /// test/dev-only backend.
    #[allow(clippy::unwrap_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredObject>> {
        self.objects.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadedAsset, BlobStoreError> {
        let asset_id = options.qualified_id();
        let mut objects = self.lock();

        if !options.overwrite && objects.contains_key(&asset_id) {
            // Mirrors the provider's unique-id behavior closely enough for
            // tests: non-overwriting uploads never clobber.
            return Err(BlobStoreError::UploadRejected(format!(
                "object already exists: {asset_id}"
            )));
        }

        objects.insert(
            asset_id.clone(),
            StoredObject {
                content,
                kind: options.kind,
            },
        );
        self.uploads.fetch_add(1, Ordering::SeqCst);

        Ok(UploadedAsset {
            url: format!("memory://{asset_id}"),
            asset_id,
        })
    }

    async fn fetch(&self, asset_id: &str, kind: AssetKind) -> Result<Vec<u8>, BlobStoreError> {
        let objects = self.lock();
        match objects.get(asset_id) {
            Some(stored) if stored.kind == kind => Ok(stored.content.clone()),
            _ => Err(BlobStoreError::NotFound(asset_id.to_string())),
        }
    }

    async fn delete(&self, asset_id: &str, _kind: AssetKind) -> Result<(), BlobStoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Provider(
                "simulated delete failure".to_string(),
            ));
        }

        // Absent objects delete successfully by contract.
        self.lock().remove(asset_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::PRODUCTS_FOLDER;
    use super::*;

    fn image_options<'a>(public_id: &'a str, overwrite: bool) -> UploadOptions<'a> {
        UploadOptions {
            folder: PRODUCTS_FOLDER,
            public_id,
            overwrite,
            allowed_formats: &[],
            kind: AssetKind::Image,
        }
    }

    #[tokio::test]
    async fn test_upload_fetch_delete() {
        let store = MemoryBlobStore::new();
        let asset = store
            .upload(vec![1, 2, 3], image_options("1", false))
            .await
            .expect("upload");
        assert_eq!(asset.asset_id, "products/1");
        assert_eq!(asset.url, "memory://products/1");

        let content = store
            .fetch("products/1", AssetKind::Image)
            .await
            .expect("fetch");
        assert_eq!(content, vec![1, 2, 3]);

        store
            .delete("products/1", AssetKind::Image)
            .await
            .expect("delete");
        assert!(!store.contains("products/1"));
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let store = MemoryBlobStore::new();
        let err = store
            .fetch("products/none", AssetKind::Image)
            .await
            .expect_err("should be absent");
        assert!(matches!(err, BlobStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_absent_succeeds() {
        let store = MemoryBlobStore::new();
        store
            .delete("products/none", AssetKind::Image)
            .await
            .expect("absent delete is ok");
    }

    #[tokio::test]
    async fn test_overwrite_replaces() {
        let store = MemoryBlobStore::new();
        store
            .upload(vec![1], image_options("qr", true))
            .await
            .expect("first upload");
        store
            .upload(vec![2], image_options("qr", true))
            .await
            .expect("second upload");
        assert_eq!(store.object("products/qr"), Some(vec![2]));
        assert_eq!(store.upload_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_object() {
        let store = MemoryBlobStore::new();
        store
            .upload(vec![1], image_options("1", false))
            .await
            .expect("upload");
        store.fail_deletes(true);
        let err = store.delete("products/1", AssetKind::Image).await;
        assert!(err.is_err());
        assert!(store.contains("products/1"));
    }
}
