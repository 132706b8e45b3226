//! Catalog records as served by the backend.

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::StockLevel;
use crate::ids::{ProductId, VariantId};
use crate::money::{deserialize_opt_price, deserialize_price, Money};

/// A phone (or other variant-bearing product) in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Fallback image when a variant has none.
    #[serde(default)]
    pub base_image: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_reviews: u32,
    /// Price used when the product has no variants.
    #[serde(default, deserialize_with = "deserialize_opt_price")]
    pub base_price: Option<Money>,
    /// Present on detail responses; list responses omit it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Check if this product offers color/storage variants.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Identifier to link to: the slug when known, otherwise the id.
    pub fn handle(&self) -> &str {
        self.slug.as_deref().unwrap_or(self.id.as_str())
    }
}

/// One color/storage combination of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: VariantId,
    pub color: String,
    #[serde(default)]
    pub color_image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub storage: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count_in_stock: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reserved_stock: i64,
    /// Per-order ceiling; `None` means the storefront default.
    #[serde(default)]
    pub max_purchase_quantity: Option<u32>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl ProductVariant {
    /// Stock counts for this variant.
    pub fn stock(&self) -> StockLevel {
        StockLevel::new(self.count_in_stock, self.reserved_stock)
    }

    /// Variant's own image, if it has one.
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .or(self.color_image.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// An accessory: a single-SKU product without variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Accessory {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Money,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count_in_stock: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl Accessory {
    pub fn stock(&self) -> StockLevel {
        StockLevel::new(self.count_in_stock, 0)
    }
}

/// Paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// A list endpoint that may or may not paginate.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paged(page) => page.results,
            Listing::Plain(items) => items,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
