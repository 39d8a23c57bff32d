//! Outfitter - session-based storefront with WhatsApp checkout

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outfitter::config::Settings;
use outfitter::routes::{build_router, AppState};

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

    let settings = Settings::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &settings.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to NATS, order events disabled");
                None
            }
        },
        None => None,
    };

    let port = settings.port;
    let state = AppState {
        db,
        nats,
        settings: Arc::new(settings),
    };
    let app = build_router(state);

    tracing::info!("🚀 outfitter listening on 0.0.0.0:{}", port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?,
        app,
    )
    .await?;
    Ok(())
}
