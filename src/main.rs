use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use school_system::app::{self, AppState};
use school_system::database::{DatabaseManager, PgTenantRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = school_system::config::config();
    tracing::info!("Starting school system in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database, &config.tenancy.public_schema_name)
        .await
        .context("failed to connect to database")?;

    let registry = Arc::new(PgTenantRegistry::new(database.pool().clone()));
    let connections = Arc::new(database.connection_source());
    let state = AppState::from_config(registry, connections, config);
    let service = app::service(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("School system listening on http://{}", bind_addr);

    axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
