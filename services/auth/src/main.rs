use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod accounts;
mod config;
mod error;
mod jwt;
mod middleware;
mod models;
mod password;
mod rate_limiter;
mod repositories;
mod routes;
mod validation;

use common::{
    auth::TokenVerifier,
    database::{DatabaseConfig, init_pool, run_migrations},
};

use crate::{
    config::{BootstrapConfig, ServerConfig},
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{UserStore, user::UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub jwt: JwtService,
    pub verifier: TokenVerifier,
    pub throttle: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let server_config = ServerConfig::load()?;
    let jwt = JwtService::new(JwtConfig::from_env()?)?;
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

    let store = Arc::new(UserRepository::new(pool.clone()));

    let bootstrap = BootstrapConfig::load()?;
    match bootstrap.credentials() {
        Some((username, password, name)) => {
            accounts::bootstrap_super_admin(&*store, username, password, name).await?;
        }
        None => info!("No super admin bootstrap credentials configured"),
    }

    let app_state = AppState {
        store,
        jwt,
        verifier,
        throttle: RateLimiter::new(RateLimiterConfig::default()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&server_config.bind_addr).await?;
    info!("Authentication service listening on {}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Authentication service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
