//! Dokaan - headless storefront checkout and order service.

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dokaan::auth::AuthClient;
use dokaan::config::Config;
use dokaan::email::Mailer;
use dokaan::ratelimit::SlidingWindowLimiter;
use dokaan::routes;
use dokaan::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, continuing without events");
                None
            }
        },
        None => None,
    };

    let auth = AuthClient::new(&config.auth_url, &config.auth_api_key)?;
    let mailer = match &config.email {
        Some(email_config) => Some(Mailer::new(email_config)?),
        None => None,
    };

    let limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_window,
        config.rate_limit_max_attempts,
    ));
    let sweeper = Arc::clone(&limiter);
    let sweep_every = config.rate_limit_window;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper.sweep();
        }
    });

    let state = AppState {
        db,
        nats,
        auth,
        mailer,
        limiter,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("dokaan listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
