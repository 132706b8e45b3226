//! Cart module.
//!
//! Contains the line item type and the persisted cart store.

mod line_item;
mod store;

pub use line_item::{CartLineItem, ACCESSORY_ID_PREFIX, DEFAULT_OPTION};
pub use store::{summarize, CartStore, CartSummary, CART_KEY};
