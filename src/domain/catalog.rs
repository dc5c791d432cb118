//! Catalog types: published products and checkout-time snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Catalog row as served by the read API.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory state of a product at checkout time.
///
/// A stored quantity of 0 means the stock is not tracked for that product
/// and never blocks a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stock {
    Tracked(u32),
    Untracked,
}

impl Stock {
    pub fn from_stored(quantity: i32) -> Self {
        match u32::try_from(quantity) {
            Ok(0) | Err(_) => Self::Untracked,
            Ok(n) => Self::Tracked(n),
        }
    }

    /// Whether `requested` units can be sold from this stock level.
    pub fn can_fulfil(self, requested: u32) -> bool {
        match self {
            Self::Untracked => true,
            Self::Tracked(available) => requested <= available,
        }
    }
}

/// Authoritative product data captured once per checkout request.
/// Client-supplied prices are never consulted.
#[derive(Clone, Debug)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub stock: Stock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_stock_is_untracked() {
        assert_eq!(Stock::from_stored(0), Stock::Untracked);
        assert_eq!(Stock::from_stored(5), Stock::Tracked(5));
        assert_eq!(Stock::from_stored(-3), Stock::Untracked);
    }

    #[test]
    fn test_untracked_accepts_any_quantity() {
        assert!(Stock::Untracked.can_fulfil(1));
        assert!(Stock::Untracked.can_fulfil(10_000));
    }

    #[test]
    fn test_tracked_boundary() {
        assert!(Stock::Tracked(3).can_fulfil(3));
        assert!(!Stock::Tracked(3).can_fulfil(4));
    }
}
