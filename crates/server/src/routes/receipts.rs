//! Receipt submission and management handlers.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, post},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Receipt, parse_cart_items};
use crate::state::AppState;
use crate::storage::{RECEIPTS_FOLDER, normalize_asset_id};
use crate::upload::{self, IMAGE_FORMATS};

/// Build the receipts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_receipt))
        .route("/receipts", get(list_receipts))
        .route("/receipts/{order_id}", delete(delete_receipt))
}

/// Response for a submitted receipt.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub message: String,
    pub receipt: Receipt,
}

/// Response for a deleted receipt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDeleteResponse {
    pub message: String,
    pub order_id: String,
}

/// `POST /upload` - submit an order receipt, image optional.
///
/// `cartItems` arrives as a JSON-encoded string field; a malformed
/// payload becomes an empty cart rather than failing the submission.
/// New receipts are prepended so the collection stays newest-first.
///
/// # Errors
///
/// 400 for an invalid attached image; 500 on store I/O.
pub async fn upload_receipt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ReceiptResponse>, AppError> {
    let form = upload::read_form(multipart, "receipt").await?;

    // Image first: a rejected upload must not touch the collection.
    let asset = match &form.file {
        Some(file) => Some(
            upload::store_image(state.blobs(), RECEIPTS_FOLDER, file, IMAGE_FORMATS).await?,
        ),
        None => None,
    };

    let order_id = form
        .non_empty("orderId")
        .unwrap_or_else(|| format!("ORD{}", upload::now_millis()));
    let uploaded_at = form
        .non_empty("timestamp")
        .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let receipt = Receipt {
        order_id,
        customer_name: form.text_owned("cname").unwrap_or_default(),
        note: form.text_owned("note").unwrap_or_default(),
        total: form.text_owned("total").unwrap_or_default(),
        payment_method: form.text_owned("paymentMethod").unwrap_or_default(),
        uploaded_at,
        cart_items: parse_cart_items(form.text("cartItems").unwrap_or_default()),
        receipt_url: asset.as_ref().map(|a| a.url.clone()),
        asset_id: asset.map(|a| a.asset_id),
    };

    let mut receipts: Vec<Receipt> = state
        .documents()
        .ensure(Receipt::COLLECTION, Vec::new())
        .await?;
    receipts.insert(0, receipt.clone());
    state.documents().save(Receipt::COLLECTION, &receipts).await?;

    tracing::info!(order_id = %receipt.order_id, "receipt stored");
    Ok(Json(ReceiptResponse {
        message: "Receipt uploaded".to_string(),
        receipt,
    }))
}

/// `GET /receipts` - the full collection, newest first.
///
/// # Errors
///
/// Fails only on document store I/O errors.
pub async fn list_receipts(
    State(state): State<AppState>,
) -> Result<Json<Vec<Receipt>>, AppError> {
    let receipts: Vec<Receipt> = state
        .documents()
        .ensure(Receipt::COLLECTION, Vec::new())
        .await?;
    Ok(Json(receipts))
}

/// `DELETE /receipts/{orderId}` - remove the first matching receipt.
///
/// An attached receipt image is deleted best-effort.
///
/// # Errors
///
/// 404 when no receipt matches; 500 on document store I/O.
pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ReceiptDeleteResponse>, AppError> {
    let mut receipts: Vec<Receipt> = state
        .documents()
        .ensure(Receipt::COLLECTION, Vec::new())
        .await?;
    let index = receipts
        .iter()
        .position(|r| r.order_id == order_id)
        .ok_or_else(|| AppError::NotFound("Receipt not found".to_string()))?;

    if let Some(asset_id) = &receipts[index].asset_id {
        let normalized = normalize_asset_id(asset_id, RECEIPTS_FOLDER);
        upload::discard_asset(state.blobs(), &normalized).await;
    }

    receipts.remove(index);
    state.documents().save(Receipt::COLLECTION, &receipts).await?;

    tracing::info!(order_id = %order_id, "receipt deleted");
    Ok(Json(ReceiptDeleteResponse {
        message: "Receipt deleted".to_string(),
        order_id,
    }))
}
