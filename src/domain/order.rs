//! Orders and order items.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shipping::DeliveryZone;

/// Persisted order row. Status-like columns are plain text in the store and
/// converted to enums at the edges.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub status: String,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub payment_trx_id: Option<String>,
    pub customer_name: String,
    pub contact_number: String,
    pub shipping_address: String,
    pub delivery_location: String,
    pub discount_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted order item row.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Line item priced for an order that has no database identity yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Fully priced order ready for the two-phase insert.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub contact_number: String,
    pub shipping_address: String,
    pub delivery_location: DeliveryZone,
    pub payment_method: PaymentMethod,
    pub payment_trx_id: Option<String>,
    pub discount_code: Option<String>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Bkash,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Bkash => "bkash",
        }
    }

    /// Human-readable name used on invoices.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Bkash => "bKash",
        }
    }
}

/// Generates a human-readable order number: `ORD-<YYYYMMDD>-<4 digits>`.
///
/// Uniqueness is not checked here; the unique constraint on the orders
/// table is the backstop for the rare same-day collision.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{suffix:04}", now.format("%Y%m%d"))
}

/// `total = max(0, subtotal - discount) + shipping`.
///
/// Holds for any inputs, including a discount above the subtotal.
pub fn compose_total(subtotal: Decimal, discount: Decimal, shipping: Decimal) -> Decimal {
    (subtotal - discount).max(Decimal::ZERO) + shipping
}
