//! Storefront domain logic for the phone shop client.
//!
//! This crate holds everything between the shopper and the backend:
//!
//! - **Catalog**: products, variants, stock status, variant selection
//! - **Cart**: persisted cart lines with merge-on-add and totals
//! - **Checkout**: hosted session creation and the success/cancel landings
//! - **Backend**: typed calls over the storefront HTTP API
//! - **Webhook**: signature checks for payment lifecycle events
//!
//! Client state (the cart and the in-flight session token) lives in a
//! [`shop_cache::Cache`], which plays the part of browser local storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_commerce::prelude::*;
//!
//! let cache = Cache::open_dir("/tmp/shop")?;
//! let api = BackendApi::with_base_url(DEFAULT_BACKEND_URL);
//!
//! // Pick a variant and add it to the cart
//! let product = api.lookup_product("pixel-8").await?;
//! let mut resolver = VariantResolver::new(product);
//! resolver.select_color("Obsidian")?;
//! CartStore::new(&cache).add(resolver.to_line_item()?)?;
//!
//! // Send the shopper to the hosted checkout
//! let initiator = CheckoutInitiator::new(
//!     api.clone(),
//!     &cache,
//!     ReturnUrls::for_origin("http://localhost:3000"),
//!     RecordingNavigator::new(),
//! );
//! let started = initiator.checkout_cart().await?;
//! println!("Pay at {}", started.url);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod webhook;

pub use backend::{BackendApi, DEFAULT_BACKEND_URL};
pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{BackendApi, DEFAULT_BACKEND_URL};
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use shop_cache::Cache;

    // Catalog
    pub use crate::catalog::{
        Accessory, Page, Product, ProductVariant, StockLevel, StockStatus, VariantResolver,
        VariantView,
    };

    // Cart
    pub use crate::cart::{CartLineItem, CartStore, CartSummary};

    // Checkout
    pub use crate::checkout::{
        CancelOutcome, CheckoutInitiator, CheckoutStarted, CommitOutcome, Navigator,
        OrderSummary, Reconciler, RecordingNavigator, ReturnUrls, SessionDetails, SessionState,
        SuccessOutcome,
    };

    // Webhook
    pub use crate::webhook::{WebhookEvent, WebhookEventKind, WebhookVerifier};
}
