use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod agents;
mod catalog;
mod config;
mod error;
mod ledger;
mod middleware;
mod models;
mod repositories;
mod routes;
mod shop;
mod state;
mod workflow;

use common::{
    auth::TokenVerifier,
    database::{DatabaseConfig, init_pool, run_migrations},
};

use crate::{config::ServerConfig, repositories::postgres::PgStore, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::load()?;
    let verifier = TokenVerifier::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool).await?;

    let app_state = AppState {
        store: Arc::new(PgStore::new(pool.clone())),
        verifier,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&server_config.bind_addr).await?;
    info!("API service listening on {}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("API service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
