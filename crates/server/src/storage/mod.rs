//! Object storage: the blob store abstraction and its backends.
//!
//! Every binary asset (product image, receipt photo, QR code) and every
//! JSON document collection lives in an external object store addressed
//! by a folder-scoped public id. Handlers talk to the store through the
//! [`BlobStore`] trait so tests can substitute [`MemoryBlobStore`] for
//! the production [`CloudinaryStore`].

mod cloudinary;
pub mod documents;
mod memory;

pub use cloudinary::CloudinaryStore;
pub use memory::MemoryBlobStore;

use thiserror::Error;

/// Folder for JSON document collections.
pub const DOCUMENTS_FOLDER: &str = "documents";
/// Folder for product images.
pub const PRODUCTS_FOLDER: &str = "products";
/// Folder for receipt photos.
pub const RECEIPTS_FOLDER: &str = "receipts";
/// Folder for the QR code singleton asset.
pub const QRCODES_FOLDER: &str = "qrcodes";

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// No object exists under the given id.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The provider rejected the upload (quota, disallowed format, ...).
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    /// The provider returned an unexpected response.
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport-level failure talking to the provider.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What kind of object an id refers to.
///
/// The provider namespaces images and raw (arbitrary-bytes) objects
/// separately, so delete and fetch need to know which side to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// An uploaded image (product, receipt, QR code).
    Image,
    /// Raw bytes; used for JSON document collections.
    Raw,
}

impl AssetKind {
    /// Provider resource-type path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
        }
    }
}

/// Options for a single upload.
#[derive(Debug, Clone)]
pub struct UploadOptions<'a> {
    /// Folder the object is stored under.
    pub folder: &'a str,
    /// Object id within the folder (no extension).
    pub public_id: &'a str,
    /// Replace any existing object at the same id.
    pub overwrite: bool,
    /// Extension allow-list enforced by the provider; empty = no restriction.
    pub allowed_formats: &'a [&'a str],
    /// Image or raw object.
    pub kind: AssetKind,
}

impl UploadOptions<'_> {
    /// Full provider id: `folder/public_id`.
    #[must_use]
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.folder, self.public_id)
    }
}

/// A successfully stored object.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Externally resolvable URL.
    pub url: String,
    /// Id used for later fetch/delete.
    pub asset_id: String,
}

/// An id-addressed object store with folder-scoped keys.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under `options.folder/options.public_id`.
    async fn upload(
        &self,
        content: Vec<u8>,
        options: UploadOptions<'_>,
    ) -> Result<UploadedAsset, BlobStoreError>;

    /// Fetch an object's content by id.
    ///
    /// # Errors
    ///
    /// `BlobStoreError::NotFound` if no object exists under `asset_id`.
    async fn fetch(&self, asset_id: &str, kind: AssetKind) -> Result<Vec<u8>, BlobStoreError>;

    /// Delete an object by id. Deleting an absent object succeeds.
    async fn delete(&self, asset_id: &str, kind: AssetKind) -> Result<(), BlobStoreError>;
}

/// Normalize an asset reference for deletion.
///
/// Asset ids that round-trip through stored records may carry a file
/// extension and may have lost their folder prefix. The provider keys
/// objects by extensionless, folder-qualified id, so deletion with an
/// unnormalized reference would target the wrong object (or nothing).
#[must_use]
pub fn normalize_asset_id(raw: &str, folder: &str) -> String {
    let (dir, file) = match raw.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, raw),
    };

    // Strip a trailing extension from the final segment only.
    let stem = file.rsplit_once('.').map_or(file, |(stem, _ext)| stem);

    match dir {
        Some(dir) => format!("{dir}/{stem}"),
        None => format!("{folder}/{stem}"),
    }
}
