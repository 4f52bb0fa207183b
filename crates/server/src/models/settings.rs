//! Storefront settings: the QR code singleton.

use serde::{Deserialize, Serialize};

/// Singleton settings record, replaced wholesale on QR code upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Payment QR code image URL; empty until one is uploaded.
    #[serde(default)]
    pub qr_code_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

impl Settings {
    /// Logical document collection name.
    pub const COLLECTION: &'static str = "settings";
}
