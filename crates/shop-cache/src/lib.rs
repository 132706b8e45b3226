//! Typed key-value persistence for the storefront client session.
//!
//! This is the storefront's stand-in for browser local storage: a flat
//! namespace of string keys, each holding one JSON document. Two backends
//! ship with the crate:
//!
//! - [`MemoryBackend`] for tests and throwaway sessions
//! - [`FileBackend`], one `<key>.json` file per key in a directory
//!
//! # Example
//!
//! ```rust,ignore
//! use shop_cache::{Cache, Slot};
//!
//! let cache = Cache::open_dir("/tmp/shop-store")?;
//!
//! // Raw typed access
//! cache.set("cart", &vec!["a", "b"])?;
//! let cart: Option<Vec<String>> = cache.get("cart")?;
//!
//! // A single key bound to a type
//! let token: Slot<String> = cache.slot("stripe_checkout_session_id");
//! token.set(&"cs_123".to_string())?;
//! assert_eq!(token.take()?, Some("cs_123".to_string()));
//! ```

mod backend;
mod error;
mod kv;
mod slot;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use error::CacheError;
pub use kv::Cache;
pub use slot::Slot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError, KvBackend, Slot};
}
