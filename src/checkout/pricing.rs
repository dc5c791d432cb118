//! Line-item building and order pricing.
//!
//! Pure over its inputs: the caller supplies the catalog snapshot, the
//! voucher row and the clock, so the same inputs always price the same.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::order::{compose_total, NewOrderItem};
use crate::domain::shipping::{shipping_cost, DeliveryZone, ShippingSpeed};
use crate::domain::voucher::Voucher;
use crate::error::CheckoutError;

/// One cart line after input normalization. Quantity is already a positive
/// whole number; the price comes from the catalog, never the client.
#[derive(Clone, Debug)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Priced order before persistence.
#[derive(Clone, Debug)]
pub struct Quote {
    pub items: Vec<NewOrderItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Validates every cart line against the snapshot and computes per-line
/// totals. The whole checkout fails on the first unavailable or
/// under-stocked product; nothing is silently dropped.
pub fn build_line_items(
    lines: &[CartLine],
    catalog: &HashMap<Uuid, ProductSnapshot>,
) -> Result<(Vec<NewOrderItem>, Decimal), CheckoutError> {
    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        if line.quantity == 0 {
            continue;
        }
        let product = catalog
            .get(&line.product_id)
            .ok_or_else(|| CheckoutError::ProductUnavailable(line.product_id.to_string()))?;
        if !product.stock.can_fulfil(line.quantity) {
            return Err(CheckoutError::InsufficientStock {
                name: product.name.clone(),
            });
        }

        let total_price = product.unit_price * Decimal::from(line.quantity);
        subtotal += total_price;
        items.push(NewOrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            quantity: line.quantity,
            unit_price: product.unit_price,
            total_price,
        });
    }

    if items.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    Ok((items, subtotal))
}

/// Runs the pricing pipeline: line items, voucher discount, shipping, total.
pub fn price_order(
    lines: &[CartLine],
    catalog: &HashMap<Uuid, ProductSnapshot>,
    voucher: Option<&Voucher>,
    zone: DeliveryZone,
    speed: ShippingSpeed,
    now: DateTime<Utc>,
) -> Result<Quote, CheckoutError> {
    let (items, subtotal) = build_line_items(lines, catalog)?;
    let discount = match voucher {
        Some(v) => v.discount_for(subtotal, now)?,
        None => Decimal::ZERO,
    };
    let shipping = shipping_cost(zone, speed);
    let total = compose_total(subtotal, discount, shipping);

    Ok(Quote {
        items,
        subtotal,
        discount,
        shipping,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Stock;

    fn snapshot(name: &str, price: i64, stock: Stock) -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: format!("SKU-{}", name.to_uppercase()),
            unit_price: Decimal::from(price),
            stock,
        }
    }

    fn catalog_of(products: Vec<ProductSnapshot>) -> HashMap<Uuid, ProductSnapshot> {
        products.into_iter().map(|p| (p.id, p)).collect()
    }

    fn save10() -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            discount_type: "percentage".to_string(),
            discount_value: Decimal::from(10),
            min_purchase: Decimal::ZERO,
            max_uses: None,
            current_uses: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
        }
    }

    // Scenario: guest cart of qty 1 @ 500 and qty 2 @ 250, inside Dhaka,
    // standard shipping, no voucher.
    #[test]
    fn test_cod_checkout_totals() {
        let shirt = snapshot("shirt", 500, Stock::Tracked(10));
        let mug = snapshot("mug", 250, Stock::Tracked(10));
        let lines = vec![
            CartLine { product_id: shirt.id, quantity: 1 },
            CartLine { product_id: mug.id, quantity: 2 },
        ];
        let catalog = catalog_of(vec![shirt, mug]);

        let quote = price_order(
            &lines,
            &catalog,
            None,
            DeliveryZone::Inside,
            ShippingSpeed::Standard,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(quote.subtotal, Decimal::from(1000));
        assert_eq!(quote.discount, Decimal::ZERO);
        assert_eq!(quote.shipping, Decimal::from(60));
        assert_eq!(quote.total, Decimal::from(1060));
        assert_eq!(quote.items.len(), 2);
    }

    #[test]
    fn test_percentage_voucher_applies() {
        let shirt = snapshot("shirt", 500, Stock::Tracked(10));
        let mug = snapshot("mug", 250, Stock::Tracked(10));
        let lines = vec![
            CartLine { product_id: shirt.id, quantity: 1 },
            CartLine { product_id: mug.id, quantity: 2 },
        ];
        let catalog = catalog_of(vec![shirt, mug]);

        let quote = price_order(
            &lines,
            &catalog,
            Some(&save10()),
            DeliveryZone::Inside,
            ShippingSpeed::Standard,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(quote.discount, Decimal::from(100));
        assert_eq!(quote.total, Decimal::from(960));
    }

    #[test]
    fn test_minimum_purchase_rejected() {
        let mug = snapshot("mug", 400, Stock::Tracked(10));
        let lines = vec![CartLine { product_id: mug.id, quantity: 1 }];
        let catalog = catalog_of(vec![mug]);

        let mut voucher = save10();
        voucher.min_purchase = Decimal::from(500);

        let err = price_order(
            &lines,
            &catalog,
            Some(&voucher),
            DeliveryZone::Inside,
            ShippingSpeed::Standard,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, CheckoutError::MinimumPurchaseNotMet { .. }));
    }

    #[test]
    fn test_untracked_stock_never_blocks() {
        let poster = snapshot("poster", 100, Stock::Untracked);
        let lines = vec![CartLine { product_id: poster.id, quantity: 9999 }];
        let catalog = catalog_of(vec![poster]);

        let (items, subtotal) = build_line_items(&lines, &catalog).unwrap();
        assert_eq!(items[0].quantity, 9999);
        assert_eq!(subtotal, Decimal::from(999_900));
    }

    #[test]
    fn test_insufficient_stock_names_product() {
        let shirt = snapshot("shirt", 500, Stock::Tracked(2));
        let lines = vec![CartLine { product_id: shirt.id, quantity: 3 }];
        let catalog = catalog_of(vec![shirt]);

        match build_line_items(&lines, &catalog) {
            Err(CheckoutError::InsufficientStock { name }) => assert_eq!(name, "shirt"),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_product_fails_whole_checkout() {
        let shirt = snapshot("shirt", 500, Stock::Tracked(10));
        let lines = vec![
            CartLine { product_id: shirt.id, quantity: 1 },
            CartLine { product_id: Uuid::new_v4(), quantity: 1 },
        ];
        let catalog = catalog_of(vec![shirt]);

        assert!(matches!(
            build_line_items(&lines, &catalog),
            Err(CheckoutError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn test_all_zero_quantities_is_empty_order() {
        let shirt = snapshot("shirt", 500, Stock::Tracked(10));
        let lines = vec![CartLine { product_id: shirt.id, quantity: 0 }];
        let catalog = catalog_of(vec![shirt]);

        assert!(matches!(
            build_line_items(&lines, &catalog),
            Err(CheckoutError::EmptyOrder)
        ));
    }
}
