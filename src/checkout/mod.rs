//! The checkout pipeline.
//!
//! Sequencing: payment validation, input normalization, identity
//! resolution, catalog snapshot, voucher lookup, pricing, two-phase
//! persistence, then best-effort side effects (voucher usage increment,
//! invoice email, order-created event). Validation failures short-circuit
//! with a specific user-facing error.

pub mod identity;
pub mod pricing;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::db;
use crate::domain::events::OrderEvent;
use crate::domain::normalize::normalize_quantity;
use crate::domain::order::{generate_order_number, NewOrder, Order, PaymentMethod};
use crate::domain::shipping::{DeliveryZone, ShippingSpeed};
use crate::email;
use crate::error::CheckoutError;
use crate::state::AppState;

use self::identity::{GuestDetails, ResolvedCustomer};
use self::pricing::{CartLine, Quote};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartLineInput>,
    pub delivery_location: DeliveryZone,
    #[serde(default)]
    pub shipping_speed: Option<String>,
    #[serde(default)]
    pub discount_code: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub trx_id: Option<String>,
    #[serde(default)]
    pub guest: Option<GuestDetails>,
}

#[derive(Debug, Deserialize)]
pub struct CartLineInput {
    pub product_id: String,
    pub quantity: f64,
}

#[derive(Clone, Debug)]
pub struct CheckoutReceipt {
    pub order_id: Uuid,
    pub order_number: String,
    pub contact: String,
}

/// What happened to the voucher usage counter after the order committed.
/// A `Failed` update is logged by the caller but never fails the checkout:
/// the order already exists and must be reported as placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoucherUpdate {
    NotApplicable,
    Applied,
    Failed(String),
}

#[derive(Debug)]
pub struct CheckoutOutcome {
    pub receipt: CheckoutReceipt,
    pub voucher_update: VoucherUpdate,
}

/// bKash needs a customer-supplied transaction id; Cash on Delivery does not.
pub fn validate_payment(
    method: PaymentMethod,
    trx_id: Option<&str>,
) -> Result<Option<String>, CheckoutError> {
    match method {
        PaymentMethod::Bkash => {
            let trx = trx_id
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(CheckoutError::MissingTrxId)?;
            Ok(Some(trx.to_string()))
        }
        PaymentMethod::Cod => Ok(None),
    }
}

/// Floors quantities, drops zero-quantity lines and parses product ids.
fn normalize_lines(inputs: &[CartLineInput]) -> Result<Vec<CartLine>, CheckoutError> {
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        let quantity = normalize_quantity(input.quantity);
        if quantity == 0 {
            continue;
        }
        let product_id = input
            .product_id
            .parse()
            .map_err(|_| CheckoutError::ProductUnavailable(input.product_id.clone()))?;
        lines.push(CartLine {
            product_id,
            quantity,
        });
    }
    if lines.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    Ok(lines)
}

async fn resolve_identity(
    state: &AppState,
    bearer: Option<&str>,
    guest: Option<GuestDetails>,
) -> Result<ResolvedCustomer, CheckoutError> {
    match bearer {
        Some(token) => {
            let user_id = state.auth.resolve_user(token).await?;
            let profile = db::fetch_profile(&state.db, user_id)
                .await?
                .ok_or(CheckoutError::IncompleteProfile)?;
            profile.resolve()
        }
        None => guest
            .ok_or_else(|| {
                CheckoutError::InvalidGuestDetails(
                    "Guest details are required for guest checkout".to_string(),
                )
            })?
            .resolve(),
    }
}

pub async fn run(
    state: &AppState,
    bearer: Option<&str>,
    req: CheckoutRequest,
) -> Result<CheckoutOutcome, CheckoutError> {
    let trx_id = validate_payment(req.payment_method, req.trx_id.as_deref())?;
    let lines = normalize_lines(&req.items)?;
    let customer = resolve_identity(state, bearer, req.guest).await?;

    let mut product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();
    let catalog = db::fetch_product_snapshots(&state.db, &product_ids).await?;

    let code = req
        .discount_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase);
    let voucher = match &code {
        Some(code) => Some(
            db::find_voucher(&state.db, code)
                .await?
                .ok_or(CheckoutError::InvalidVoucher)?,
        ),
        None => None,
    };

    let speed = ShippingSpeed::from_param(req.shipping_speed.as_deref());
    let now = Utc::now();
    let quote = pricing::price_order(
        &lines,
        &catalog,
        voucher.as_ref(),
        req.delivery_location,
        speed,
        now,
    )?;

    let new_order = NewOrder {
        order_number: generate_order_number(now),
        user_id: customer.user_id,
        customer_name: customer.customer_name.clone(),
        contact_number: customer.contact_phone.clone(),
        shipping_address: customer.shipping_address.clone(),
        delivery_location: req.delivery_location,
        payment_method: req.payment_method,
        payment_trx_id: trx_id,
        discount_code: code,
        subtotal: quote.subtotal,
        discount_amount: quote.discount,
        shipping_cost: quote.shipping,
        total: quote.total,
    };
    let order = db::persist_order(&state.db, &new_order, &quote.items).await?;

    let voucher_update = match &voucher {
        Some(v) => match db::increment_voucher_usage(&state.db, v.id).await {
            Ok(true) => VoucherUpdate::Applied,
            Ok(false) => VoucherUpdate::Failed("usage cap reached before increment".to_string()),
            Err(e) => VoucherUpdate::Failed(e.to_string()),
        },
        None => VoucherUpdate::NotApplicable,
    };

    notify(state, &order, &quote, customer.email.as_deref()).await;

    Ok(CheckoutOutcome {
        receipt: CheckoutReceipt {
            order_id: order.id,
            order_number: order.order_number,
            contact: customer.contact_phone,
        },
        voucher_update,
    })
}

/// Post-commit notifications. Failures are logged and swallowed: the order
/// has already been placed.
async fn notify(state: &AppState, order: &Order, quote: &Quote, email_to: Option<&str>) {
    if let (Some(mailer), Some(to)) = (&state.mailer, email_to) {
        let subject = format!("Your order {} is confirmed", order.order_number);
        let html = email::invoice_html(order, &quote.items);
        match mailer.send(to, &subject, &html).await {
            Ok(message_id) => {
                tracing::info!(order_number = %order.order_number, %message_id, "invoice email sent");
            }
            Err(e) => {
                tracing::warn!(order_number = %order.order_number, error = %e, "failed to send invoice email");
            }
        }
    }

    if let Some(nats) = &state.nats {
        let event = OrderEvent::Created {
            order_id: order.id,
            order_number: order.order_number.clone(),
            total: order.total,
        };
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(e) = nats.publish(event.subject(), payload.into()).await {
                    tracing::warn!(error = %e, "failed to publish order event");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode order event"),
        }
    }
}
