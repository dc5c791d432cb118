//! Environment-driven configuration.
//!
//! Required: `DATABASE_URL`, `AUTH_URL`.
//! Optional: `PORT` (8084), `AUTH_API_KEY`, `NATS_URL`,
//! `EMAIL_API_KEY` + `EMAIL_SENDER_ADDRESS` (+ `EMAIL_API_URL`,
//! `EMAIL_SENDER_NAME`), `RATE_LIMIT_WINDOW_SECS` (600),
//! `RATE_LIMIT_MAX_ATTEMPTS` (20).

use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub auth_url: String,
    pub auth_api_key: String,
    pub nats_url: Option<String>,
    pub email: Option<EmailConfig>,
    pub rate_limit_window: Duration,
    pub rate_limit_max_attempts: usize,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_name: String,
    pub sender_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8084".to_string())
            .parse()
            .context("PORT must be a number")?;
        let auth_url = std::env::var("AUTH_URL").context("AUTH_URL is required")?;
        let auth_api_key = std::env::var("AUTH_API_KEY").unwrap_or_default();
        let nats_url = std::env::var("NATS_URL").ok();

        let email = match std::env::var("EMAIL_API_KEY") {
            Ok(api_key) => Some(EmailConfig {
                api_url: std::env::var("EMAIL_API_URL")
                    .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
                api_key,
                sender_name: std::env::var("EMAIL_SENDER_NAME")
                    .unwrap_or_else(|_| "Dokaan".to_string()),
                sender_address: std::env::var("EMAIL_SENDER_ADDRESS")
                    .context("EMAIL_SENDER_ADDRESS is required when EMAIL_API_KEY is set")?,
            }),
            Err(_) => None,
        };

        let rate_limit_window = Duration::from_secs(env_u64("RATE_LIMIT_WINDOW_SECS", 600)?);
        let rate_limit_max_attempts = env_u64("RATE_LIMIT_MAX_ATTEMPTS", 20)? as usize;

        Ok(Self {
            database_url,
            port,
            auth_url,
            auth_api_key,
            nats_url,
            email,
            rate_limit_window,
            rate_limit_max_attempts,
        })
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} must be a number")),
        Err(_) => Ok(default),
    }
}
