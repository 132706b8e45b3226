//! Cart line items.

use serde::{Deserialize, Serialize};

use crate::catalog::{Accessory, Product, ProductVariant};
use crate::error::CommerceError;
use crate::ids::{LineItemId, ProductId, VariantId};
use crate::money::{deserialize_price, Money};

/// Color and storage recorded for items that have no variants.
pub const DEFAULT_OPTION: &str = "Default";

/// Prefix on the product id of accessory lines.
pub const ACCESSORY_ID_PREFIX: &str = "accessory:";

/// One line of the cart, priced at the moment it was added.
///
/// Field names are camelCase on the wire so that a cart written by the web
/// storefront loads unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    /// Absent for products sold without variants.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: Money,
    pub quantity: u32,
    pub color: String,
    pub storage: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CartLineItem {
    /// Create a line for a selection.
    ///
    /// Lines with a variant get the deterministic `{product}_{color}_{storage}`
    /// id; lines without one get a random id.
    pub fn new(
        product_id: ProductId,
        variant_id: Option<VariantId>,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
        color: impl Into<String>,
        storage: impl Into<String>,
    ) -> Self {
        let color = color.into();
        let storage = storage.into();
        let id = match variant_id {
            Some(_) => LineItemId::for_selection(&product_id, &color, &storage),
            None => LineItemId::generate(),
        };
        Self {
            id,
            product_id,
            variant_id,
            name: name.into(),
            image: None,
            price,
            quantity,
            color,
            storage,
            brand: None,
            slug: None,
        }
    }

    /// Line for one variant of a product.
    pub fn for_variant(product: &Product, variant: &ProductVariant, quantity: u32) -> Self {
        let mut line = Self::new(
            product.id.clone(),
            Some(variant.id.clone()),
            product.name.clone(),
            variant.price,
            quantity,
            variant.color.clone(),
            variant.storage.clone(),
        );
        line.image = variant
            .image()
            .map(str::to_string)
            .or_else(|| product.base_image.clone());
        line.brand = product.brand.clone();
        line.slug = product.slug.clone();
        line
    }

    /// Line for an accessory. Accessories carry no variant.
    ///
    /// Accessory and product ids are separate sequences on the backend, so
    /// the product id is prefixed to keep the two from merging.
    pub fn for_accessory(accessory: &Accessory, quantity: u32) -> Self {
        let mut line = Self::new(
            ProductId::new(format!("{}{}", ACCESSORY_ID_PREFIX, accessory.id)),
            None,
            accessory.name.clone(),
            accessory.price,
            quantity,
            DEFAULT_OPTION,
            DEFAULT_OPTION,
        );
        line.image = accessory.image.clone();
        line.brand = accessory.brand.clone();
        line.slug = accessory.slug.clone();
        line
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Whether `other` is the same product, color and storage.
    pub fn same_selection(&self, other: &CartLineItem) -> bool {
        self.product_id == other.product_id
            && self.color == other.color
            && self.storage == other.storage
    }

    /// `price * quantity`.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        self.price
            .try_multiply(i64::from(self.quantity))
            .ok_or(CommerceError::Overflow)
    }
}
