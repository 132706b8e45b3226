//! Variant selection for a product page.

use serde::Serialize;

use crate::cart::{CartLineItem, DEFAULT_OPTION};
use crate::catalog::{Product, ProductVariant, StockLevel, StockStatus};
use crate::error::CommerceError;
use crate::ids::{ProductId, VariantId};
use crate::money::Money;

/// Holds the shopper's color, storage and quantity choice for one product
/// and derives everything the page shows from it.
///
/// The held selection always names an offered combination: changing the
/// color to one that lacks the current storage moves the storage to the
/// first one offered for that color. Price, image and stock are read from
/// the active variant on every call, never cached.
#[derive(Debug, Clone)]
pub struct VariantResolver {
    product: Product,
    color: String,
    storage: String,
    quantity: u32,
}

/// Snapshot of a resolver's state.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VariantView {
    pub product_id: ProductId,
    pub name: String,
    pub color: String,
    pub storage: String,
    pub variant_id: Option<VariantId>,
    pub price: Option<Money>,
    pub image: Option<String>,
    pub available_stock: Option<i64>,
    pub max_purchase_quantity: Option<u32>,
    pub stock_status: StockStatus,
    pub quantity: u32,
}

impl VariantResolver {
    /// Start on the first variant's color and that color's first storage.
    pub fn new(product: Product) -> Self {
        let (color, storage) = match product.variants.first() {
            Some(v) => (v.color.clone(), v.storage.clone()),
            None => (DEFAULT_OPTION.to_string(), DEFAULT_OPTION.to_string()),
        };
        let mut resolver = Self {
            product,
            color,
            storage,
            quantity: 1,
        };
        resolver.clamp_quantity();
        resolver
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn storage(&self) -> &str {
        &self.storage
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Distinct colors in first-seen order.
    pub fn colors(&self) -> Vec<&str> {
        if !self.product.has_variants() {
            return vec![DEFAULT_OPTION];
        }
        let mut colors: Vec<&str> = Vec::new();
        for v in &self.product.variants {
            if !colors.contains(&v.color.as_str()) {
                colors.push(&v.color);
            }
        }
        colors
    }

    /// Distinct storages offered for `color`, in first-seen order.
    pub fn storages_for(&self, color: &str) -> Vec<&str> {
        if !self.product.has_variants() {
            return if color == DEFAULT_OPTION {
                vec![DEFAULT_OPTION]
            } else {
                Vec::new()
            };
        }
        let mut storages: Vec<&str> = Vec::new();
        for v in self.product.variants.iter().filter(|v| v.color == color) {
            if !storages.contains(&v.storage.as_str()) {
                storages.push(&v.storage);
            }
        }
        storages
    }

    /// The variant matching the held color and storage.
    pub fn active_variant(&self) -> Option<&ProductVariant> {
        self.product
            .variants
            .iter()
            .find(|v| v.color == self.color && v.storage == self.storage)
    }

    /// Price of the active variant, or the product's base price.
    pub fn price(&self) -> Option<Money> {
        match self.active_variant() {
            Some(v) => Some(v.price),
            None => self.product.base_price,
        }
    }

    /// Variant image, then color image, then the product's base image.
    pub fn image(&self) -> Option<&str> {
        self.active_variant()
            .and_then(ProductVariant::image)
            .or(self.product.base_image.as_deref())
    }

    /// Stock counts of the active variant; `None` for products without
    /// variants.
    pub fn stock(&self) -> Option<StockLevel> {
        if !self.product.has_variants() {
            return None;
        }
        Some(
            self.active_variant()
                .map(ProductVariant::stock)
                .unwrap_or_default(),
        )
    }

    pub fn available_stock(&self) -> Option<i64> {
        self.stock().map(|s| s.available())
    }

    /// Per-order ceiling; `None` means no ceiling is enforced here.
    pub fn max_purchase_quantity(&self) -> Option<u32> {
        let stock = self.stock()?;
        let cap = self.active_variant().and_then(|v| v.max_purchase_quantity);
        Some(stock.max_purchase_quantity(cap))
    }

    pub fn stock_status(&self) -> StockStatus {
        self.stock()
            .map(|s| s.status())
            .unwrap_or(StockStatus::Plenty)
    }

    /// Switch color, keeping the storage when the new color offers it.
    pub fn select_color(&mut self, color: &str) -> Result<(), CommerceError> {
        let storages = self.storages_for(color);
        let Some(first) = storages.first() else {
            return Err(CommerceError::VariantNotFound(format!(
                "{} has no color {}",
                self.product.name, color
            )));
        };
        if !storages.contains(&self.storage.as_str()) {
            let fallback = first.to_string();
            tracing::debug!(color, storage = %fallback, "storage not offered, falling back");
            self.storage = fallback;
        }
        self.color = color.to_string();
        self.clamp_quantity();
        Ok(())
    }

    /// Switch storage within the held color.
    pub fn select_storage(&mut self, storage: &str) -> Result<(), CommerceError> {
        if !self.storages_for(&self.color).contains(&storage) {
            return Err(CommerceError::VariantNotFound(format!(
                "{} has no {} {}",
                self.product.name, self.color, storage
            )));
        }
        self.storage = storage.to_string();
        self.clamp_quantity();
        Ok(())
    }

    /// Apply an optional color, then an optional storage.
    pub fn select(&mut self, color: Option<&str>, storage: Option<&str>) -> Result<(), CommerceError> {
        if let Some(color) = color {
            self.select_color(color)?;
        }
        if let Some(storage) = storage {
            self.select_storage(storage)?;
        }
        Ok(())
    }

    /// Raise the quantity by one. Returns false at the ceiling.
    pub fn increment(&mut self) -> bool {
        if let Some(max) = self.max_purchase_quantity() {
            if self.quantity >= max {
                return false;
            }
        }
        self.quantity = self.quantity.saturating_add(1);
        true
    }

    /// Lower the quantity by one. Returns false at 1.
    pub fn decrement(&mut self) -> bool {
        if self.quantity <= 1 {
            return false;
        }
        self.quantity -= 1;
        true
    }

    /// Set the quantity, clamped into the allowed range.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.clamp_quantity();
    }

    fn clamp_quantity(&mut self) {
        self.quantity = match self.max_purchase_quantity() {
            Some(max) if max > 0 => self.quantity.clamp(1, max),
            _ => self.quantity.max(1),
        };
    }

    pub fn view(&self) -> VariantView {
        VariantView {
            product_id: self.product.id.clone(),
            name: self.product.name.clone(),
            color: self.color.clone(),
            storage: self.storage.clone(),
            variant_id: self.active_variant().map(|v| v.id.clone()),
            price: self.price(),
            image: self.image().map(str::to_string),
            available_stock: self.available_stock(),
            max_purchase_quantity: self.max_purchase_quantity(),
            stock_status: self.stock_status(),
            quantity: self.quantity,
        }
    }

    /// Cart line for the current selection and quantity.
    pub fn to_line_item(&self) -> Result<CartLineItem, CommerceError> {
        if self.max_purchase_quantity() == Some(0) {
            return Err(CommerceError::OutOfStock(format!(
                "{} ({}, {})",
                self.product.name, self.color, self.storage
            )));
        }

        if let Some(variant) = self.active_variant() {
            return Ok(CartLineItem::for_variant(&self.product, variant, self.quantity));
        }

        let price = self.product.base_price.ok_or_else(|| {
            CommerceError::InvalidPrice(format!("{} has no price", self.product.name))
        })?;
        let mut line = CartLineItem::new(
            self.product.id.clone(),
            None,
            self.product.name.clone(),
            price,
            self.quantity,
            self.color.clone(),
            self.storage.clone(),
        );
        line.image = self.product.base_image.clone();
        line.brand = self.product.brand.clone();
        line.slug = self.product.slug.clone();
        Ok(line)
    }
}
