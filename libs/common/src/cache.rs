//! Redis cache for the Grúa Style services
//!
//! Thin wrapper around a multiplexed Redis connection. Every key is
//! namespaced with a configurable prefix so several deployments can share a
//! server. Used for short-lived token state (refresh-token blacklist).

use crate::error::{CacheError, CacheResult};
use redis::{AsyncCommands, Client};
use tracing::info;

/// Configuration for the Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: Key namespace (default: "grua:")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix = std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "grua:".to_string());

        RedisConfig { url, key_prefix }
    }
}

/// Redis connection handle
///
/// Opening the client does not touch the network; connections are made on
/// demand by each command.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    key_prefix: String,
}

impl RedisPool {
    /// Build a pool from configuration
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.clone()).map_err(CacheError::Configuration)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Command)
    }

    /// Set a key-value pair with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let key = self.key(key);

        match ttl_seconds {
            // SETEX rejects a zero TTL
            Some(ttl) => {
                let _: () = conn
                    .set_ex(&key, value, ttl.max(1))
                    .await
                    .map_err(CacheError::Command)?;
            }
            None => {
                let _: () = conn.set(&key, value).await.map_err(CacheError::Command)?;
            }
        }

        Ok(())
    }

    /// Set a key only if it is absent, with a TTL
    ///
    /// Returns whether this call created the key. Check and write happen in
    /// one `SET NX EX` command.
    pub async fn set_nx(&self, key: &str, value: &str, ttl_seconds: u64) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(reply.is_some())
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        conn.get(self.key(key)).await.map_err(CacheError::Command)
    }

    /// Whether a key is present
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        conn.exists(self.key(key)).await.map_err(CacheError::Command)
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.key(key)).await.map_err(CacheError::Command)?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> RedisConfig {
        RedisConfig {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "grua-test:".to_string(),
        }
    }

    #[test]
    fn test_keys_are_prefixed() {
        let pool = RedisPool::new(&local_config()).unwrap();
        assert_eq!(pool.key("blacklist:abc"), "grua-test:blacklist:abc");
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let config = RedisConfig {
            url: "not a redis url".to_string(),
            key_prefix: String::new(),
        };
        assert!(matches!(
            RedisPool::new(&config),
            Err(CacheError::Configuration(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_get_delete() -> CacheResult<()> {
        let pool = RedisPool::new(&local_config())?;
        assert!(pool.health_check().await?);

        pool.set("test_key", "test_value", Some(5)).await?;
        assert_eq!(pool.get("test_key").await?, Some("test_value".to_string()));
        assert!(pool.exists("test_key").await?);

        pool.delete("test_key").await?;
        assert_eq!(pool.get("test_key").await?, None);
        assert!(!pool.exists("test_key").await?);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_nx_only_claims_once() -> CacheResult<()> {
        let pool = RedisPool::new(&local_config())?;
        pool.delete("claim_key").await?;

        let (first, second) = tokio::join!(
            pool.set_nx("claim_key", "1", 5),
            pool.set_nx("claim_key", "1", 5)
        );
        assert!(first? ^ second?);
        assert!(!pool.set_nx("claim_key", "1", 5).await?);

        pool.delete("claim_key").await?;
        Ok(())
    }
}
