//! Order lifecycle events published to NATS.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created {
        order_id: Uuid,
        order_number: String,
        total: Decimal,
    },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "dokaan.orders.created",
        }
    }
}
