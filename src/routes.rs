//! HTTP routes and handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::checkout::{self, CheckoutRequest, VoucherUpdate};
use crate::db;
use crate::domain::catalog::Product;
use crate::domain::normalize::normalize_phone;
use crate::domain::order::{Order, OrderItem};
use crate::error::CheckoutError;
use crate::ratelimit::{client_key, Decision};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/orders/track", get(track_order))
        .route("/api/v1/checkout", post(checkout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "dokaan" }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

async fn list_products(
    State(s): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, (StatusCode, String)> {
    let page = p.page.unwrap_or(1).max(1);
    let per_page = p.per_page.unwrap_or(20).min(100);
    let (products, total) = db::list_products(&s.db, page, per_page, p.search.as_deref())
        .await
        .map_err(internal)?;
    Ok(Json(PaginatedResponse {
        data: products,
        total,
        page,
    }))
}

async fn get_product(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, (StatusCode, String)> {
    db::get_product(&s.db, id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct TrackParams {
    pub number: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct TrackedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

async fn track_order(
    State(s): State<AppState>,
    Query(p): Query<TrackParams>,
) -> Result<Json<TrackedOrder>, (StatusCode, String)> {
    let phone =
        normalize_phone(&p.phone).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let found = db::find_order_for_tracking(&s.db, p.number.trim(), &phone)
        .await
        .map_err(internal)?;
    match found {
        Some((order, items)) => Ok(Json(TrackedOrder { order, items })),
        None => Err((
            StatusCode::NOT_FOUND,
            "No order matches that number and phone".to_string(),
        )),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub ok: bool,
    pub order_id: Uuid,
    pub order_number: String,
    pub contact: String,
}

async fn checkout(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, CheckoutError> {
    // Before any other validation.
    let key = client_key(&headers);
    if let Decision::Denied { retry_after } = s.limiter.check(&key) {
        return Err(CheckoutError::RateLimited {
            retry_after: retry_after.as_secs().max(1),
        });
    }

    let bearer = bearer_token(&headers);
    let outcome = checkout::run(&s, bearer.as_deref(), req).await?;

    if let VoucherUpdate::Failed(reason) = &outcome.voucher_update {
        tracing::warn!(
            order_number = %outcome.receipt.order_number,
            %reason,
            "voucher usage increment failed after order commit"
        );
    }

    Ok(Json(CheckoutResponse {
        ok: true,
        order_id: outcome.receipt.order_id,
        order_number: outcome.receipt.order_number,
        contact: outcome.receipt.contact,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    tracing::error!(error = %e, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
