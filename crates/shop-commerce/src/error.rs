//! Commerce error types.

use shop_data::FetchError;
use thiserror::Error;

/// Errors that can occur in storefront operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested color/storage combination is not offered.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Selected variant has no purchasable stock.
    #[error("Out of stock: {0}")]
    OutOfStock(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Price could not be parsed.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Checkout attempted with nothing in the cart.
    #[error("Your cart is empty. Please add items before checking out.")]
    EmptyCart,

    /// Cart lines that cannot be submitted because they lack a variant.
    #[error("Some cart items are missing a variant, please add them again: {}", .0.join(", "))]
    MissingVariant(Vec<String>),

    /// Backend refused to create a checkout session.
    #[error("Failed to create checkout session: {0}")]
    CheckoutFailed(String),

    /// Session created but no hosted checkout URL returned.
    #[error("No checkout URL returned from server")]
    MissingCheckoutUrl,

    /// Webhook signature header missing, malformed, or not matching.
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook body is not a recognizable event.
    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    /// Backend call failed.
    #[error("Backend request failed: {0}")]
    Backend(#[from] FetchError),

    /// Client storage failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<shop_cache::CacheError> for CommerceError {
    fn from(e: shop_cache::CacheError) -> Self {
        CommerceError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}
