//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                      - Liveness text
//! GET    /health                - Liveness check
//!
//! # Products
//! GET    /products              - List products
//! POST   /products              - Create product (multipart `image` required)
//! PUT    /products/{id}         - Update product (multipart `image` optional)
//! DELETE /products/{id}         - Delete product and its image
//!
//! # Receipts
//! GET    /receipts              - List receipts, newest first
//! POST   /upload                - Submit receipt (multipart `receipt` optional)
//! DELETE /receipts/{orderId}    - Delete receipt by order id
//!
//! # Settings
//! GET    /settings              - QR code settings
//! POST   /upload-qrcode         - Replace the payment QR code (multipart `qrCode`)
//! ```

pub mod products;
pub mod receipts;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the combined application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(receipts::router())
        .merge(settings::router())
}
