//! Common library for the sales incentive platform
//!
//! This crate provides the pieces shared by the identity and incentive
//! services: PostgreSQL connectivity and migrations, database error types,
//! and the bearer-token primitives both services use to identify callers.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     println!("Database health check: {}", health_check(&pool).await?);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod database;
pub mod error;
