//! The persisted cart.

use serde::Serialize;
use shop_cache::{Cache, Slot};

use crate::cart::CartLineItem;
use crate::error::CommerceError;
use crate::ids::LineItemId;
use crate::money::{Currency, Money};

/// Storage key holding the serialized line items.
pub const CART_KEY: &str = "cart";

/// Single owner of the cart contents.
///
/// Every mutation reads the stored lines, applies the change and writes the
/// whole collection back before returning it. No copy is kept in memory, so
/// two stores over the same cache see each other's writes (last writer wins).
#[derive(Debug, Clone)]
pub struct CartStore {
    slot: Slot<Vec<CartLineItem>>,
}

/// Totals over the current cart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CartSummary {
    pub lines: Vec<CartLineItem>,
    /// Sum of quantities.
    pub item_count: u64,
    pub total: Money,
}

impl CartSummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl CartStore {
    pub fn new(cache: &Cache) -> Self {
        Self {
            slot: cache.slot(CART_KEY),
        }
    }

    /// Stored lines, or none when the key is absent or unreadable.
    pub fn load(&self) -> Result<Vec<CartLineItem>, CommerceError> {
        Ok(self.slot.get_or_default()?)
    }

    /// Add a line, merging into an existing line for the same product,
    /// color and storage.
    pub fn add(&self, item: CartLineItem) -> Result<Vec<CartLineItem>, CommerceError> {
        if item.quantity == 0 {
            return Err(CommerceError::InvalidQuantity(0));
        }

        let mut lines = self.load()?;
        if let Some(existing) = lines.iter_mut().find(|l| l.same_selection(&item)) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or(CommerceError::Overflow)?;
            tracing::debug!(line = %existing.id, quantity = existing.quantity, "cart line merged");
        } else {
            tracing::debug!(line = %item.id, quantity = item.quantity, "cart line added");
            lines.push(item);
        }
        self.persist(lines)
    }

    /// Remove a line. Unknown ids are ignored.
    pub fn remove(&self, id: &LineItemId) -> Result<Vec<CartLineItem>, CommerceError> {
        let mut lines = self.load()?;
        lines.retain(|l| &l.id != id);
        self.persist(lines)
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn set_quantity(
        &self,
        id: &LineItemId,
        quantity: i64,
    ) -> Result<Vec<CartLineItem>, CommerceError> {
        if quantity <= 0 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).map_err(|_| CommerceError::InvalidQuantity(quantity))?;

        let mut lines = self.load()?;
        if let Some(line) = lines.iter_mut().find(|l| &l.id == id) {
            line.quantity = quantity;
        }
        self.persist(lines)
    }

    /// Take one unit off a line, dropping the line at zero.
    pub fn decrement(&self, id: &LineItemId) -> Result<Vec<CartLineItem>, CommerceError> {
        let mut lines = self.load()?;
        if let Some(pos) = lines.iter().position(|l| &l.id == id) {
            if lines[pos].quantity > 1 {
                lines[pos].quantity -= 1;
            } else {
                lines.remove(pos);
            }
        }
        self.persist(lines)
    }

    /// Empty the cart.
    pub fn clear(&self) -> Result<(), CommerceError> {
        self.slot.set(&Vec::new())?;
        tracing::debug!("cart cleared");
        Ok(())
    }

    /// Current lines with item count and total.
    pub fn summary(&self) -> Result<CartSummary, CommerceError> {
        summarize(self.load()?)
    }

    fn persist(&self, lines: Vec<CartLineItem>) -> Result<Vec<CartLineItem>, CommerceError> {
        self.slot.set(&lines)?;
        Ok(lines)
    }
}

/// Totals for an arbitrary set of lines, such as a snapshot taken before
/// the cart was cleared.
pub fn summarize(lines: Vec<CartLineItem>) -> Result<CartSummary, CommerceError> {
    let currency = lines
        .first()
        .map(|l| l.price.currency)
        .unwrap_or(Currency::USD);
    let subtotals = lines
        .iter()
        .map(CartLineItem::subtotal)
        .collect::<Result<Vec<_>, _>>()?;
    let total = Money::try_sum(&subtotals, currency)?;
    let item_count = lines.iter().map(|l| u64::from(l.quantity)).sum();

    Ok(CartSummary {
        lines,
        item_count,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::DEFAULT_OPTION;
    use crate::catalog::Accessory;
    use crate::ids::{ProductId, VariantId};

    fn line(product: &str, color: &str, storage: &str, cents: i64, qty: u32) -> CartLineItem {
        CartLineItem::new(
            ProductId::new(product),
            Some(VariantId::new(format!("{}-{}-{}", product, color, storage))),
            format!("Phone {}", product),
            Money::new(cents, Currency::USD),
            qty,
            color,
            storage,
        )
    }

    fn store() -> (Cache, CartStore) {
        let cache = Cache::in_memory();
        let store = CartStore::new(&cache);
        (cache, store)
    }

    #[test]
    fn test_empty_when_absent() {
        let (_, store) = store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_same_selection_merges() {
        let (_, store) = store();
        store.add(line("P1", "Black", "128GB", 99900, 1)).unwrap();
        let lines = store.add(line("P1", "Black", "128GB", 99900, 2)).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[test]
    fn test_add_different_storage_appends() {
        let (_, store) = store();
        store.add(line("P1", "Black", "128GB", 99900, 1)).unwrap();
        let lines = store.add(line("P1", "Black", "256GB", 109900, 1)).unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let (_, store) = store();
        let result = store.add(line("P1", "Black", "128GB", 99900, 0));
        assert!(matches!(result, Err(CommerceError::InvalidQuantity(0))));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let (_, store) = store();
        let lines = store.add(line("P1", "Black", "128GB", 99900, 2)).unwrap();
        let id = lines[0].id.clone();

        assert_eq!(store.set_quantity(&id, 5).unwrap()[0].quantity, 5);
        assert!(store.set_quantity(&id, 0).unwrap().is_empty());
        assert!(store.set_quantity(&id, -3).unwrap().is_empty());
    }

    #[test]
    fn test_decrement_drops_line_at_zero() {
        let (_, store) = store();
        let lines = store.add(line("P1", "Black", "128GB", 99900, 2)).unwrap();
        let id = lines[0].id.clone();

        assert_eq!(store.decrement(&id).unwrap()[0].quantity, 1);
        let lines = store.decrement(&id).unwrap();
        assert!(lines.is_empty());
        assert!(lines.iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (_, store) = store();
        store.add(line("P1", "Black", "128GB", 99900, 1)).unwrap();
        let lines = store.remove(&LineItemId::new("nope")).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let (cache, store) = store();
        store.add(line("P1", "Black", "128GB", 99900, 1)).unwrap();

        let other = CartStore::new(&cache);
        assert_eq!(other.load().unwrap().len(), 1);

        other.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_cart_loads_empty() {
        let (cache, store) = store();
        cache.set(CART_KEY, "not a cart").unwrap();
        assert!(store.load().unwrap().is_empty());

        // Still writable afterwards
        store.add(line("P1", "Black", "128GB", 99900, 1)).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_summary_totals() {
        let (_, store) = store();
        store.add(line("P1", "Black", "128GB", 99900, 2)).unwrap();
        store
            .add(CartLineItem::new(
                ProductId::new("A9"),
                None,
                "Case",
                Money::new(1999, Currency::USD),
                1,
                DEFAULT_OPTION,
                DEFAULT_OPTION,
            ))
            .unwrap();

        let summary = store.summary().unwrap();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total.amount_cents, 201799);
        assert_eq!(summary.total.display(), "$2017.99");
    }

    #[test]
    fn test_accessory_does_not_merge_with_same_numeric_product() {
        let (_, store) = store();
        store
            .add(CartLineItem::new(
                ProductId::new("5"),
                None,
                "Basic Phone",
                Money::new(19900, Currency::USD),
                1,
                DEFAULT_OPTION,
                DEFAULT_OPTION,
            ))
            .unwrap();
        let cable = Accessory {
            id: ProductId::new("5"),
            name: "USB-C Cable".to_string(),
            slug: Some("usb-c-cable".to_string()),
            brand: None,
            description: None,
            price: Money::new(1500, Currency::USD),
            count_in_stock: 40,
            image: None,
        };
        let lines = store.add(CartLineItem::for_accessory(&cable, 1)).unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Basic Phone");
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[1].name, "USB-C Cable");
        assert_eq!(lines[1].product_id.as_str(), "accessory:5");
        assert_eq!(store.summary().unwrap().total.amount_cents, 21400);
    }

    #[test]
    fn test_summary_of_empty_cart() {
        let summary = summarize(Vec::new()).unwrap();
        assert!(summary.is_empty());
        assert!(summary.total.is_zero());
    }
}
