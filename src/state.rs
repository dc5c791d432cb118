//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::AuthClient;
use crate::email::Mailer;
use crate::ratelimit::SlidingWindowLimiter;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub nats: Option<async_nats::Client>,
    pub auth: AuthClient,
    /// Absent when no email API key is configured; invoice mail is skipped.
    pub mailer: Option<Mailer>,
    pub limiter: Arc<SlidingWindowLimiter>,
}
