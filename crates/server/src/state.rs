//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::documents::DocumentStore;
use crate::storage::{BlobStore, CloudinaryStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Handlers reach the blob store and the
/// document store through here rather than through ambient globals, so
/// tests can swap in an in-memory backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    blobs: Arc<dyn BlobStore>,
    documents: DocumentStore,
}

impl AppState {
    /// Create production state backed by the configured object store.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let blobs: Arc<dyn BlobStore> = Arc::new(CloudinaryStore::new(config.cloudinary.clone()));
        Self::with_blob_store(blobs)
    }

    /// Create state on top of an arbitrary blob store backend.
    #[must_use]
    pub fn with_blob_store(blobs: Arc<dyn BlobStore>) -> Self {
        let documents = DocumentStore::new(blobs.clone());
        Self {
            inner: Arc::new(AppStateInner { blobs, documents }),
        }
    }

    /// Get a reference to the blob store.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.inner.blobs.as_ref()
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn documents(&self) -> &DocumentStore {
        &self.inner.documents
    }
}
