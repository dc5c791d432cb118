//! Checkout error taxonomy and HTTP mapping.
//!
//! Validation failures carry a specific user-facing message. Infrastructure
//! failures are logged server-side with full detail and surfaced to the
//! client as a generic message.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Too many checkout attempts. Please try again in {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Please provide a valid Bangladeshi phone number (01XXXXXXXXX)")]
    InvalidPhone,

    #[error("{0}")]
    InvalidGuestDetails(String),

    #[error("Your profile is missing a name, phone number or address")]
    IncompleteProfile,

    #[error("Your cart is empty")]
    EmptyOrder,

    #[error("Product {0} is no longer available")]
    ProductUnavailable(String),

    #[error("Not enough stock for {name}")]
    InsufficientStock { name: String },

    #[error("Invalid discount code")]
    InvalidVoucher,

    #[error("This discount code is inactive")]
    VoucherInactive,

    #[error("This discount code is not active yet")]
    VoucherNotYetActive,

    #[error("This discount code has expired")]
    VoucherExpired,

    #[error("This code requires a minimum purchase of {min} BDT")]
    MinimumPurchaseNotMet { min: Decimal },

    #[error("This discount code has reached its usage limit")]
    VoucherExhausted,

    #[error("This discount code cannot be applied")]
    VoucherMisconfigured,

    #[error("A bKash transaction ID is required")]
    MissingTrxId,

    #[error("Invalid or expired credentials")]
    Unauthorized,

    #[error("could not load the product catalog")]
    CatalogUnavailable,

    #[error("failed to persist order")]
    OrderPersistFailure(#[source] sqlx::Error),

    #[error("failed to persist order items")]
    OrderItemsPersistFailure(#[source] sqlx::Error),

    #[error("auth service unavailable")]
    AuthUnavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CatalogUnavailable
            | Self::OrderPersistFailure(_)
            | Self::OrderItemsPersistFailure(_)
            | Self::AuthUnavailable
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error = %self,
                source = ?std::error::Error::source(&self),
                "checkout failed"
            );
            "Something went wrong on our side. Please try again.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({ "ok": false, "message": message }));
        let mut response = (status, body).into_response();
        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after.into());
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
