//! Service-level configuration

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::Tariff;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Base URL of the admin site, used in notification links
    pub admin_base_url: String,
    /// Public tariff for customers without an active membership
    pub default_tariff: Tariff,
    /// Capacity of the admin notification queue
    pub notification_queue_size: usize,
}

/// Largest amount a `NUMERIC(10,2)` fare column holds
const MAX_FARE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2); // 99_999_999.99

fn decimal_var(name: &str, default: i64) -> Result<Decimal> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed = Decimal::from_str(value.trim())
                .with_context(|| format!("{} must be a decimal number, got {:?}", name, value))?;
            if parsed.is_sign_negative() {
                anyhow::bail!("{} must not be negative", name);
            }
            if parsed.normalize().scale() > 2 {
                anyhow::bail!("{} must have at most two decimals, got {}", name, parsed);
            }
            if parsed > MAX_FARE {
                anyhow::bail!("{} must not exceed {}, got {}", name, MAX_FARE, parsed);
            }
            Ok(parsed)
        }
        _ => Ok(Decimal::from(default)),
    }
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: Listen address (default: "0.0.0.0:8000")
    /// - `ADMIN_BASE_URL`: Admin site base URL (default: "https://www.gruastyle.com")
    /// - `DEFAULT_TARIFA_BASE`: Public base fare (default: 5000)
    /// - `DEFAULT_TARIFA_POR_KM`: Public per-km fare (default: 500)
    /// - `DEFAULT_TARIFA_MINIMA`: Public minimum fare (default: 8000)
    /// - `NOTIFICATION_QUEUE_SIZE`: Pending notifications kept in memory (default: 256)
    pub fn from_env() -> Result<Self> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let admin_base_url = std::env::var("ADMIN_BASE_URL")
            .unwrap_or_else(|_| "https://www.gruastyle.com".to_string())
            .trim_end_matches('/')
            .to_string();

        let default_tariff = Tariff::new(
            decimal_var("DEFAULT_TARIFA_BASE", 5000)?,
            decimal_var("DEFAULT_TARIFA_POR_KM", 500)?,
            decimal_var("DEFAULT_TARIFA_MINIMA", 8000)?,
        );

        let notification_queue_size = std::env::var("NOTIFICATION_QUEUE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);

        Ok(AppConfig {
            bind_address,
            admin_base_url,
            default_tariff,
            notification_queue_size,
        })
    }
}
