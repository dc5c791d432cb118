//! Data access: catalog, vouchers, orders and profiles.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::checkout::identity::Profile;
use crate::domain::catalog::{Product, ProductSnapshot, Stock};
use crate::domain::normalize::coerce_amount;
use crate::domain::order::{NewOrder, NewOrderItem, Order, OrderItem};
use crate::domain::voucher::Voucher;
use crate::error::CheckoutError;

#[derive(sqlx::FromRow)]
struct ProductSnapshotRow {
    id: Uuid,
    name: String,
    sku: String,
    price: Option<Decimal>,
    stock_quantity: i32,
}

impl ProductSnapshotRow {
    fn into_snapshot(self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name,
            sku: self.sku,
            unit_price: coerce_amount(self.price, Decimal::ZERO),
            stock: Stock::from_stored(self.stock_quantity),
        }
    }
}

/// Batch-fetches the authoritative price/stock snapshot for a checkout.
/// A fetch error or an empty result set both fail the checkout.
pub async fn fetch_product_snapshots(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, ProductSnapshot>, CheckoutError> {
    let rows = sqlx::query_as::<_, ProductSnapshotRow>(
        "SELECT id, name, sku, price, stock_quantity FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "catalog snapshot fetch failed");
        CheckoutError::CatalogUnavailable
    })?;

    if rows.is_empty() {
        return Err(CheckoutError::CatalogUnavailable);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let snapshot = row.into_snapshot();
            (snapshot.id, snapshot)
        })
        .collect())
}

/// Case-insensitive voucher lookup; `code` is already upper-cased.
/// A store failure is logged and reported as an invalid code so it can
/// never hand out an unverified discount.
pub async fn find_voucher(pool: &PgPool, code: &str) -> Result<Option<Voucher>, CheckoutError> {
    sqlx::query_as::<_, Voucher>("SELECT * FROM vouchers WHERE upper(code) = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "voucher lookup failed");
            CheckoutError::InvalidVoucher
        })
}

/// Increments the usage counter, guarded so `current_uses` can never pass
/// `max_uses` even under concurrent redemptions. Returns whether a row was
/// updated.
pub async fn increment_voucher_usage(pool: &PgPool, voucher_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE vouchers SET current_uses = current_uses + 1 \
         WHERE id = $1 AND (max_uses IS NULL OR current_uses < max_uses)",
    )
    .bind(voucher_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<Profile>, CheckoutError> {
    sqlx::query_as::<_, Profile>(
        "SELECT user_id, full_name, phone, address, email FROM profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "profile fetch failed");
        CheckoutError::Internal("profile fetch failed".to_string())
    })
}

/// Two-phase order write: insert the order row, then its items. This is not
/// a transaction; if an item insert fails the order row is deleted by hand,
/// and a crash between the two phases leaves an orphaned order behind.
pub async fn persist_order(
    pool: &PgPool,
    order: &NewOrder,
    items: &[NewOrderItem],
) -> Result<Order, CheckoutError> {
    let order_row = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, user_id, status, subtotal, discount_amount, \
         shipping_cost, total, payment_method, payment_status, payment_trx_id, customer_name, \
         contact_number, shipping_address, delivery_location, discount_code, created_at, updated_at) \
         VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, 'pending', $9, $10, $11, $12, $13, $14, NOW(), NOW()) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.subtotal)
    .bind(order.discount_amount)
    .bind(order.shipping_cost)
    .bind(order.total)
    .bind(order.payment_method.as_str())
    .bind(order.payment_trx_id.as_deref())
    .bind(&order.customer_name)
    .bind(&order.contact_number)
    .bind(&order.shipping_address)
    .bind(order.delivery_location.as_str())
    .bind(order.discount_code.as_deref())
    .fetch_one(pool)
    .await
    .map_err(CheckoutError::OrderPersistFailure)?;

    for item in items {
        let inserted = sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, product_name, product_sku, \
             quantity, unit_price, total_price) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::now_v7())
        .bind(order_row.id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_sku)
        .bind(item.quantity as i32)
        .bind(item.unit_price)
        .bind(item.total_price)
        .execute(pool)
        .await;

        if let Err(e) = inserted {
            if let Err(del) = sqlx::query("DELETE FROM orders WHERE id = $1")
                .bind(order_row.id)
                .execute(pool)
                .await
            {
                tracing::error!(
                    order_id = %order_row.id,
                    error = %del,
                    "failed to remove order after item insert failure"
                );
            }
            return Err(CheckoutError::OrderItemsPersistFailure(e));
        }
    }

    Ok(order_row)
}

pub async fn list_products(
    pool: &PgPool,
    page: u32,
    per_page: u32,
    search: Option<&str>,
) -> Result<(Vec<Product>, i64), sqlx::Error> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE is_published \
         AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%') \
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(i64::from(per_page))
    .bind(i64::from((page - 1) * per_page))
    .bind(search)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE is_published \
         AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
    )
    .bind(search)
    .fetch_one(pool)
    .await?;

    Ok((products, total.0))
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND is_published")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Customer-facing order lookup: the order number alone is guessable, so a
/// matching contact number is required as well.
pub async fn find_order_for_tracking(
    pool: &PgPool,
    order_number: &str,
    contact_number: &str,
) -> Result<Option<(Order, Vec<OrderItem>)>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE order_number = $1 AND contact_number = $2",
    )
    .bind(order_number)
    .bind(contact_number)
    .fetch_optional(pool)
    .await?;

    match order {
        Some(order) => {
            let items = sqlx::query_as::<_, OrderItem>(
                "SELECT * FROM order_items WHERE order_id = $1 ORDER BY product_name",
            )
            .bind(order.id)
            .fetch_all(pool)
            .await?;
            Ok(Some((order, items)))
        }
        None => Ok(None),
    }
}
