//! QR code settings handlers.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::models::Settings;
use crate::state::AppState;
use crate::upload;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/upload-qrcode", post(upload_qr_code))
}

/// Response for a QR code upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub success: bool,
    pub message: String,
    pub qr_code_url: String,
    pub asset_id: String,
}

/// `GET /settings` - the settings singleton, created empty on first access.
///
/// # Errors
///
/// Fails only on document store I/O errors.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    let settings = state
        .documents()
        .ensure(Settings::COLLECTION, Settings::default())
        .await?;
    Ok(Json(settings))
}

/// `POST /upload-qrcode` - replace the payment QR code.
///
/// The image always uploads under the same fixed id with overwrite, so
/// the previous QR code object is replaced in place; the settings
/// document is then rewritten wholesale.
///
/// # Errors
///
/// 400 when the `qrCode` file is missing or invalid; 500 on store I/O.
pub async fn upload_qr_code(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<QrCodeResponse>, AppError> {
    let form = upload::read_form(multipart, "qrCode").await?;
    let file = form.require_file("qrCode")?;

    let asset = upload::store_qr_code(state.blobs(), file).await?;

    let settings = Settings {
        qr_code_url: asset.url.clone(),
        asset_id: Some(asset.asset_id.clone()),
    };
    state
        .documents()
        .save(Settings::COLLECTION, &settings)
        .await?;

    tracing::info!(asset_id = %asset.asset_id, "QR code replaced");
    Ok(Json(QrCodeResponse {
        success: true,
        message: "QR code updated".to_string(),
        qr_code_url: asset.url,
        asset_id: asset.asset_id,
    }))
}
