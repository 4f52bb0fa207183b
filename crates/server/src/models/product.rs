//! Product records.

use serde::{Deserialize, Serialize};

/// A product listed in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Creation time in epoch milliseconds. Monotonic-ish, not a strict
    /// uniqueness guarantee.
    pub id: i64,
    pub name: String,
    /// Decimal amount kept as a string; the panel formats it client-side.
    pub price: String,
    pub description: String,
    /// Externally resolvable image URL.
    pub image_url: String,
    /// Blob store reference for later deletion.
    pub asset_id: String,
}

impl Product {
    /// Logical document collection name.
    pub const COLLECTION: &'static str = "products";

    /// Replace only the fields a partial update supplies.
    pub fn apply_update(
        &mut self,
        name: Option<String>,
        price: Option<String>,
        description: Option<String>,
    ) {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(description) = description {
            self.description = description;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        Product {
            id: 1_712_345_678_000,
            name: "Drip coffee".to_string(),
            price: "3.50".to_string(),
            description: "12oz".to_string(),
            image_url: "https://cdn.example/products/1712345678000.jpg".to_string(),
            asset_id: "products/1712345678000".to_string(),
        }
    }

    #[test]
    fn test_apply_update_retains_missing_fields() {
        let mut product = sample();
        product.apply_update(None, Some("4.00".to_string()), None);
        assert_eq!(product.price, "4.00");
        assert_eq!(product.name, "Drip coffee");
        assert_eq!(product.description, "12oz");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(sample()).expect("serialize");
        assert!(value.get("imageUrl").is_some());
        assert!(value.get("assetId").is_some());
        assert!(value.get("image_url").is_none());
    }
}
