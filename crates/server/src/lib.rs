//! Shopdesk server library.
//!
//! Backend for a storefront admin panel: accepts image and receipt
//! uploads, keeps lightweight JSON collections (products, receipts,
//! QR-code settings) in a cloud object store, and serves them over a
//! small REST surface.
//!
//! Exposed as a library so the API tests can drive the router
//! in-process against an in-memory blob store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower_http::cors::CorsLayer;

use state::AppState;

/// Request body cap: the file size limit plus headroom for multipart
/// framing and text fields. The pipeline's own 5 MiB check stays the
/// authoritative limit.
const REQUEST_BODY_LIMIT: usize = upload::MAX_UPLOAD_BYTES + 1024 * 1024;

/// Build the application router.
///
/// The panel frontend is served from elsewhere, hence the permissive
/// CORS layer.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness text for `GET /`.
async fn index() -> &'static str {
    "Shopdesk admin API is running"
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
