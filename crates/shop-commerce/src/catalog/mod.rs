//! Catalog module.
//!
//! Contains product records, stock derivation, and the variant resolver.

mod product;
mod resolver;
mod stock;

pub use product::{Accessory, Listing, Page, Product, ProductVariant};
pub use resolver::{VariantResolver, VariantView};
pub use stock::{StockLevel, StockStatus, DEFAULT_MAX_PURCHASE_QUANTITY, LOW_STOCK_THRESHOLD};
