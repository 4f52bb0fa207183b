//! Upload pipeline: multipart intake, image validation, blob placement.
//!
//! Validation happens here, before any document collection is touched,
//! so a rejected upload never leaves a half-mutated collection behind.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::error::AppError;
use crate::storage::{AssetKind, BlobStore, QRCODES_FOLDER, UploadOptions, UploadedAsset};

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Formats accepted for product and receipt images.
pub const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Formats accepted for the payment QR code.
pub const QR_FORMATS: &[&str] = &["jpg", "jpeg", "png"];

/// Fixed public id of the QR code singleton asset. Every upload
/// overwrites the same object.
pub const QR_CODE_ID: &str = "qr-code";

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub content: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// A fully read multipart submission: at most one file plus text fields.
#[derive(Debug, Default)]
pub struct FormSubmission {
    pub file: Option<IncomingFile>,
    fields: HashMap<String, String>,
}

impl FormSubmission {
    /// A text field's value, if the client sent it.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field's value as an owned `String`, if sent.
    #[must_use]
    pub fn text_owned(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// A text field's value, treating an empty submission as absent.
    ///
    /// Partial updates and defaulting both use this: a blank form field
    /// means "keep the stored value", not "overwrite with empty".
    #[must_use]
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.fields.get(name).filter(|s| !s.is_empty()).cloned()
    }

    /// The file, or a validation error naming the expected field.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` when no file was attached.
    pub fn require_file(&self, field: &str) -> Result<&IncomingFile, AppError> {
        self.file
            .as_ref()
            .ok_or_else(|| AppError::Validation(format!("No {field} file uploaded")))
    }
}

/// Drain a multipart body, treating `file_field` as the single file
/// field and everything else as text.
///
/// # Errors
///
/// Fails with a 400-class error when the multipart stream is malformed.
pub async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<FormSubmission, AppError> {
    let mut submission = FormSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == file_field {
            let file_name = field.file_name().map(ToString::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let content = field.bytes().await?;
            submission.file = Some(IncomingFile {
                content,
                file_name,
                content_type,
            });
        } else {
            submission.fields.insert(name, field.text().await?);
        }
    }

    Ok(submission)
}

/// Sniff an image format from magic bytes.
fn sniff_format(content: &[u8]) -> Option<&'static str> {
    if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if content.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        Some("gif")
    } else {
        None
    }
}

/// Validate size and sniffed type against an allow-list.
///
/// # Errors
///
/// `AppError::Validation` when the file exceeds [`MAX_UPLOAD_BYTES`];
/// `AppError::UnsupportedFormat` when the content is not a recognized,
/// allowed image format.
pub fn validate_image(file: &IncomingFile, allowed: &[&str]) -> Result<&'static str, AppError> {
    if file.content.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "File too large: limit is {MAX_UPLOAD_BYTES} bytes"
        )));
    }

    let format = sniff_format(&file.content).ok_or_else(|| {
        AppError::UnsupportedFormat("Unsupported image type".to_string())
    })?;

    if !allowed.contains(&format) {
        return Err(AppError::UnsupportedFormat(format!(
            "Unsupported image type: {format}"
        )));
    }

    Ok(format)
}

/// Current time in epoch milliseconds, nudged forward so back-to-back
/// calls in the same process never return the same value. Used for
/// product/receipt ids and image public ids.
#[must_use]
pub fn now_millis() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST.load(Ordering::SeqCst);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Validate and store a per-item image under a fresh millisecond id.
///
/// # Errors
///
/// Validation errors per [`validate_image`], or a storage error from the
/// provider.
pub async fn store_image(
    blobs: &dyn BlobStore,
    folder: &str,
    file: &IncomingFile,
    allowed: &[&str],
) -> Result<UploadedAsset, AppError> {
    validate_image(file, allowed)?;

    let public_id = now_millis().to_string();
    let asset = blobs
        .upload(
            file.content.to_vec(),
            UploadOptions {
                folder,
                public_id: &public_id,
                overwrite: false,
                allowed_formats: allowed,
                kind: AssetKind::Image,
            },
        )
        .await?;

    tracing::debug!(asset_id = %asset.asset_id, folder, "stored image");
    Ok(asset)
}

/// Delete a blob without failing the surrounding operation.
///
/// Failures are logged and reported back as `false`; callers are free to
/// ignore the result. Delete-product must succeed from the caller's
/// perspective even when the backing image refuses to go away.
pub async fn discard_asset(blobs: &dyn BlobStore, asset_id: &str) -> bool {
    match blobs.delete(asset_id, AssetKind::Image).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(asset_id, error = %e, "best-effort blob delete failed");
            false
        }
    }
}

/// Validate and store the QR code under its fixed id, overwriting the
/// previous one.
///
/// # Errors
///
/// Validation errors per [`validate_image`], or a storage error from the
/// provider.
pub async fn store_qr_code(
    blobs: &dyn BlobStore,
    file: &IncomingFile,
) -> Result<UploadedAsset, AppError> {
    validate_image(file, QR_FORMATS)?;

    let asset = blobs
        .upload(
            file.content.to_vec(),
            UploadOptions {
                folder: QRCODES_FOLDER,
                public_id: QR_CODE_ID,
                overwrite: true,
                allowed_formats: QR_FORMATS,
                kind: AssetKind::Image,
            },
        )
        .await?;

    tracing::debug!(asset_id = %asset.asset_id, "replaced QR code");
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal valid headers for each sniffable format.
    pub(crate) const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00];
    pub(crate) const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
    pub(crate) const GIF_HEADER: &[u8] = b"GIF89a\x00";

    fn file(content: &[u8]) -> IncomingFile {
        IncomingFile {
            content: Bytes::copy_from_slice(content),
            file_name: Some("upload.bin".to_string()),
            content_type: None,
        }
    }

    #[test]
    fn test_non_empty_treats_blank_field_as_absent() {
        let mut submission = FormSubmission::default();
        submission.fields.insert("name".to_string(), String::new());
        submission.fields.insert("price".to_string(), "12.50".to_string());

        assert_eq!(submission.non_empty("name"), None);
        assert_eq!(submission.non_empty("price"), Some("12.50".to_string()));
        assert_eq!(submission.non_empty("missing"), None);
        // text_owned still reports the blank field as sent.
        assert_eq!(submission.text_owned("name"), Some(String::new()));
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff_format(JPEG_HEADER), Some("jpeg"));
        assert_eq!(sniff_format(PNG_HEADER), Some("png"));
        assert_eq!(sniff_format(GIF_HEADER), Some("gif"));
        assert_eq!(sniff_format(b"plain text"), None);
        assert_eq!(sniff_format(&[]), None);
    }

    #[test]
    fn test_validate_accepts_allowed_format() {
        assert_eq!(validate_image(&file(JPEG_HEADER), IMAGE_FORMATS).ok(), Some("jpeg"));
        assert_eq!(validate_image(&file(GIF_HEADER), IMAGE_FORMATS).ok(), Some("gif"));
    }

    #[test]
    fn test_validate_rejects_gif_for_qr() {
        let err = validate_image(&file(GIF_HEADER), QR_FORMATS).expect_err("gif not allowed");
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_unknown_bytes() {
        let err = validate_image(&file(b"%PDF-1.4"), IMAGE_FORMATS).expect_err("not an image");
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_oversize() {
        let mut content = Vec::from(JPEG_HEADER);
        content.resize(MAX_UPLOAD_BYTES + 1, 0);
        let err = validate_image(&file(&content), IMAGE_FORMATS).expect_err("too large");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_now_millis_is_strictly_increasing() {
        let first = now_millis();
        let second = now_millis();
        assert!(second > first);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let mut content = Vec::from(JPEG_HEADER);
        content.resize(MAX_UPLOAD_BYTES, 0);
        assert!(validate_image(&file(&content), IMAGE_FORMATS).is_ok());
    }
}
