//! Newtype IDs for type-safe identifiers.
//!
//! The backend hands out integer primary keys while the payment processor
//! uses opaque strings; both are held as strings here. Deserialization
//! accepts either a JSON string or a JSON integer.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                Self(n.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_string_or_int(deserializer).map(Self)
            }
        }
    };
}

define_id!(
    /// Catalog product identifier.
    ProductId
);
define_id!(
    /// Identifier of one color/storage variant of a product.
    VariantId
);
define_id!(
    /// Cart line identifier, unique within a cart.
    LineItemId
);
define_id!(
    /// Hosted checkout session token issued by the payment processor.
    CheckoutSessionId
);

impl ProductId {
    /// Whether this id is a numeric primary key rather than a slug.
    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl LineItemId {
    /// Line id for a product/color/storage selection.
    pub fn for_selection(product_id: &ProductId, color: &str, storage: &str) -> Self {
        Self(format!("{}_{}_{}", product_id, color, storage))
    }

    /// Random line id for items that carry no variant.
    pub fn generate() -> Self {
        Self(generate_token("line"))
    }
}

/// Generate a random URL-safe token with a readable prefix.
pub(crate) fn generate_token(prefix: &str) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;

    let bytes: [u8; 12] = rand::thread_rng().gen();
    format!("{}_{}", prefix, URL_SAFE_NO_PAD.encode(bytes))
}

fn deserialize_string_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("42");
        assert_eq!(id.as_str(), "42");
        assert_eq!(format!("{}", id), "42");
    }

    #[test]
    fn test_id_from_json_int_or_string() {
        let from_int: VariantId = serde_json::from_str("17").unwrap();
        let from_str: VariantId = serde_json::from_str(r#""17""#).unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(serde_json::to_string(&from_int).unwrap(), r#""17""#);
    }

    #[test]
    fn test_numeric_detection() {
        assert!(ProductId::new("123").is_numeric());
        assert!(!ProductId::new("pixel-8-pro").is_numeric());
        assert!(!ProductId::new("").is_numeric());
    }

    #[test]
    fn test_line_id_for_selection() {
        let id = LineItemId::for_selection(&ProductId::new("P1"), "Black", "128GB");
        assert_eq!(id.as_str(), "P1_Black_128GB");
    }

    #[test]
    fn test_line_id_generation() {
        let a = LineItemId::generate();
        let b = LineItemId::generate();
        assert!(a.as_str().starts_with("line_"));
        // 12 random bytes -> 16 base64 chars
        assert_eq!(a.as_str().len(), "line_".len() + 16);
        assert_ne!(a, b);
    }
}
