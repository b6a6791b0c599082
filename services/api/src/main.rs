use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod booking;
mod config;
mod error;
mod jwt;
mod middleware;
mod models;
mod notifications;
mod pricing;
mod repositories;
mod routes;
mod state;
mod validation;

use axum::{ServiceExt, extract::Request};
use grua_common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
    error::DatabaseError,
};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    jwt::{JwtConfig, JwtService},
    notifications::{NotificationHub, NotificationWorker, TelegramClient, TelegramConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Grúa Style API service");

    let app_config = AppConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env();
    let redis_pool = RedisPool::new(&redis_config)?;
    if !redis_pool.health_check().await.unwrap_or(false) {
        warn!("Redis is not reachable, token refresh and logout will fail until it is");
    }

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Admin notifications run on their own task
    let telegram = TelegramClient::new(TelegramConfig::from_env())?;
    let (hub, rx) = NotificationHub::new(app_config.notification_queue_size);
    let worker = NotificationWorker::new(rx, Arc::new(telegram), app_config.admin_base_url.clone());
    let worker_handle = tokio::spawn(worker.run());

    let bind_address = app_config.bind_address.clone();
    let app_state = AppState::new(pool, redis_pool, jwt_service, hub, app_config);

    // Start the web server
    let app = routes::create_app(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("API service listening on {}", bind_address);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // the router held the last hub handle; let queued notifications drain
    if let Err(e) = worker_handle.await {
        warn!("Notification worker ended abnormally: {}", e);
    }

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
