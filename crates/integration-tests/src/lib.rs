//! API tests for Shopdesk.
//!
//! Tests drive the real axum `Router` in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory blob store, so
//! no network or credentials are involved.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use shopdesk_server::state::AppState;
use shopdesk_server::storage::MemoryBlobStore;

/// Multipart boundary used by every test request.
pub const BOUNDARY: &str = "shopdesk-test-boundary";

/// Minimal valid JPEG header bytes (sniffable as image/jpeg).
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// Minimal valid PNG header bytes.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

/// Minimal valid GIF header bytes.
pub const GIF_BYTES: &[u8] = b"GIF89a\x00\x00";

/// One part of a multipart submission.
pub enum Part<'a> {
    /// A plain text field.
    Text(&'a str, &'a str),
    /// A file field.
    File {
        field: &'a str,
        filename: &'a str,
        content_type: &'a str,
        content: &'a [u8],
    },
}

/// The app under test plus a handle on its blob store.
pub struct TestApp {
    pub blobs: Arc<MemoryBlobStore>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Build the full application router over a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::with_blob_store(blobs.clone());
        Self {
            blobs,
            router: shopdesk_server::app(state),
        }
    }

    /// Send a request and return status plus parsed JSON body.
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// `GET` a path.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    /// `DELETE` a path.
    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.request(
            Request::builder()
                .method("DELETE")
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    /// Send a multipart request (`POST` or `PUT`).
    pub async fn send_multipart(
        &self,
        method: &str,
        path: &str,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let body = multipart_body(BOUNDARY, parts);
        self.request(
            Request::builder()
                .method(method)
                .uri(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .expect("request"),
        )
        .await
    }
}

/// Encode parts as a `multipart/form-data` body.
#[must_use]
pub fn multipart_body(boundary: &str, parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                field,
                filename,
                content_type,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Create a product with the given fields; returns its JSON record.
pub async fn create_product(app: &TestApp, name: &str, price: &str, description: &str) -> Value {
    let (status, body) = app
        .send_multipart(
            "POST",
            "/products",
            &[
                Part::Text("name", name),
                Part::Text("price", price),
                Part::Text("description", description),
                Part::File {
                    field: "image",
                    filename: "product.jpg",
                    content_type: "image/jpeg",
                    content: JPEG_BYTES,
                },
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body["product"].clone()
}

/// Submit a receipt with the given order id; returns its JSON record.
pub async fn create_receipt(app: &TestApp, order_id: &str) -> Value {
    let (status, body) = app
        .send_multipart(
            "POST",
            "/upload",
            &[
                Part::Text("orderId", order_id),
                Part::Text("total", "10.00"),
                Part::Text("cname", "Test Customer"),
                Part::Text("paymentMethod", "cash"),
                Part::Text("cartItems", "[]"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "receipt upload failed: {body}");
    body["receipt"].clone()
}
