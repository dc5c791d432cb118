//! Client for the external auth service: exchanges a bearer token for a
//! user identity.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CheckoutError;

#[derive(Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a bearer token to the account id it belongs to.
    pub async fn resolve_user(&self, bearer: &str) -> Result<Uuid, CheckoutError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "auth service request failed");
                CheckoutError::AuthUnavailable
            })?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await.map_err(|e| {
                    tracing::error!(error = %e, "auth service returned malformed user");
                    CheckoutError::AuthUnavailable
                })?;
                Ok(user.id)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CheckoutError::Unauthorized),
            status => {
                tracing::error!(%status, "auth service returned unexpected status");
                Err(CheckoutError::AuthUnavailable)
            }
        }
    }
}
