//! Environment-derived settings.

use anyhow::Context;
use std::env;

/// Number the WhatsApp deep links point at when `OWNER_WHATSAPP_NUMBER`
/// is not configured.
pub const DEFAULT_OWNER_WHATSAPP: &str = "919876543210";

const DEFAULT_PORT: u16 = 8083;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub owner_whatsapp_number: String,
    pub nats_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            owner_whatsapp_number: env::var("OWNER_WHATSAPP_NUMBER").unwrap_or_else(|_| {
                tracing::info!(
                    "OWNER_WHATSAPP_NUMBER not set, using default {}",
                    DEFAULT_OWNER_WHATSAPP
                );
                DEFAULT_OWNER_WHATSAPP.to_string()
            }),
            nats_url: env::var("NATS_URL").ok(),
        })
    }
}
