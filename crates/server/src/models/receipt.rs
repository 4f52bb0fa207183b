//! Receipt records and cart payload parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of a submitted cart, projected down from whatever else the
/// client sent. Field types stay loose (`Value`) because the panel
/// frontend is not strict about them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub quantity: Value,
}

/// A submitted order receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub order_id: String,
    pub customer_name: String,
    pub note: String,
    pub total: String,
    pub payment_method: String,
    /// RFC 3339 timestamp of the upload.
    pub uploaded_at: String,
    pub cart_items: Vec<CartItem>,
    /// Present only when a receipt image was attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

impl Receipt {
    /// Logical document collection name.
    pub const COLLECTION: &'static str = "receipts";
}

/// Parse the `cartItems` form field: a JSON-encoded array of objects.
///
/// Each item is projected to `{id, name, price, quantity}`; extra client
/// fields are dropped. A malformed payload silently becomes an empty
/// cart rather than failing the upload.
#[must_use]
pub fn parse_cart_items(raw: &str) -> Vec<CartItem> {
    serde_json::from_str(raw).unwrap_or_default()
}
