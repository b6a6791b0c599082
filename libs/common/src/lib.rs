//! Common library for the Grúa Style backend
//!
//! Shared infrastructure used by the services: PostgreSQL pooling, the Redis
//! cache handle, and the error types they report.
//!
//! ```rust,no_run
//! use grua_common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
