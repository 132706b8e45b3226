//! Stock availability as shown to shoppers.
//!
//! The backend owns the counts; this module only derives display state
//! from them.

use serde::{Deserialize, Serialize};

/// Available units at or below this count are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Per-order ceiling used when a variant does not specify one.
pub const DEFAULT_MAX_PURCHASE_QUANTITY: u32 = 10;

/// Coarse stock indicator for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Nothing on hand and nothing held.
    Out,
    /// Nothing available, but units are held by open checkouts and may
    /// come back.
    Reserved,
    /// A handful left.
    Low,
    Plenty,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Out => "out",
            StockStatus::Reserved => "reserved",
            StockStatus::Low => "low",
            StockStatus::Plenty => "plenty",
        }
    }

    /// Whether a shopper can buy at least one unit.
    pub fn is_purchasable(&self) -> bool {
        matches!(self, StockStatus::Low | StockStatus::Plenty)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock counts for one variant as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockLevel {
    /// Units physically on hand.
    pub count_in_stock: i64,
    /// Units held by open checkout sessions.
    pub reserved_stock: i64,
}

impl StockLevel {
    pub fn new(count_in_stock: i64, reserved_stock: i64) -> Self {
        Self {
            count_in_stock,
            reserved_stock,
        }
    }

    /// Units a shopper can still buy, never negative.
    pub fn available(&self) -> i64 {
        self.count_in_stock.saturating_sub(self.reserved_stock).max(0)
    }

    /// Stock indicator; a pure function of the two counts.
    pub fn status(&self) -> StockStatus {
        let available = self.available();
        if available == 0 {
            if self.reserved_stock > 0 {
                StockStatus::Reserved
            } else {
                StockStatus::Out
            }
        } else if available <= LOW_STOCK_THRESHOLD {
            StockStatus::Low
        } else {
            StockStatus::Plenty
        }
    }

    /// Largest quantity one order may request.
    ///
    /// `cap` is the variant's own per-order limit; `None` means
    /// [`DEFAULT_MAX_PURCHASE_QUANTITY`].
    pub fn max_purchase_quantity(&self, cap: Option<u32>) -> u32 {
        let available = self.available();
        if available <= 0 {
            return 0;
        }
        let cap = cap.unwrap_or(DEFAULT_MAX_PURCHASE_QUANTITY);
        u32::try_from(available).map_or(cap, |a| a.min(cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(StockLevel::new(10, 0).status(), StockStatus::Plenty);
        assert_eq!(StockLevel::new(4, 0).status(), StockStatus::Low);
        assert_eq!(StockLevel::new(0, 3).status(), StockStatus::Reserved);
        assert_eq!(StockLevel::new(0, 0).status(), StockStatus::Out);
    }

    #[test]
    fn test_extreme_counts_do_not_overflow() {
        assert_eq!(StockLevel::new(0, i64::MIN).available(), i64::MAX);
        assert_eq!(StockLevel::new(0, i64::MIN).status(), StockStatus::Plenty);
        assert_eq!(StockLevel::new(i64::MIN, i64::MAX).status(), StockStatus::Reserved);
        assert_eq!(StockLevel::new(i64::MAX, -1).max_purchase_quantity(None), 10);
    }

    #[test]
    fn test_status_threshold_edges() {
        assert_eq!(StockLevel::new(5, 0).status(), StockStatus::Low);
        assert_eq!(StockLevel::new(6, 0).status(), StockStatus::Plenty);
        assert_eq!(StockLevel::new(8, 3).status(), StockStatus::Low);
        // Fully reserved counts as reserved, not out
        assert_eq!(StockLevel::new(3, 3).status(), StockStatus::Reserved);
    }

    #[test]
    fn test_available_never_negative() {
        let level = StockLevel::new(2, 5);
        assert_eq!(level.available(), 0);
        assert_eq!(level.status(), StockStatus::Reserved);
    }

    #[test]
    fn test_max_purchase_quantity() {
        assert_eq!(StockLevel::new(50, 0).max_purchase_quantity(None), 10);
        assert_eq!(StockLevel::new(3, 0).max_purchase_quantity(None), 3);
        assert_eq!(StockLevel::new(50, 0).max_purchase_quantity(Some(2)), 2);
        assert_eq!(StockLevel::new(0, 4).max_purchase_quantity(Some(2)), 0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StockStatus::Reserved).unwrap(), r#""reserved""#);
        assert!(StockStatus::Low.is_purchasable());
        assert!(!StockStatus::Out.is_purchasable());
    }
}
