//! Persisted record types for the admin panel collections.
//!
//! Field names are camelCase on the wire and in the stored JSON
//! documents, matching the panel frontend.

mod product;
mod receipt;
mod settings;

pub use product::Product;
pub use receipt::{CartItem, Receipt, parse_cart_items};
pub use settings::Settings;
