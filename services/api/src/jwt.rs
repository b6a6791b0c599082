//! JWT service for token generation, validation, and management
//!
//! Tokens are signed with RS256. Refresh tokens carry a `jti` so they can be
//! revoked in Redis on rotation and logout without storing the token itself.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;
use uuid::Uuid;

use grua_common::cache::RedisPool;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

/// Read a PEM key given inline or as a path to a file
fn load_key(var: &str) -> Result<String> {
    let value = std::env::var(var)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    let contents = std::fs::read_to_string(&value)
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))?;
    Ok(contents.trim().to_string())
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key (PEM) or path to the private key file
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to the public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = load_key("JWT_PRIVATE_KEY")?;
        let public_key = load_key("JWT_PUBLIC_KEY")?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key,
            public_key,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Username at issue time
    pub username: String,
    /// Unique token id
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// Seconds until expiry, zero when already expired
    pub fn remaining_lifetime(&self) -> Result<u64> {
        Ok(self.exp.saturating_sub(unix_now()?))
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Access/refresh pair handed out at login and registration
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

fn blacklist_key(jti: &Uuid) -> String {
    format!("blacklisted_token:{}", jti)
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        })
    }

    fn issue(&self, user: &User, token_type: TokenType, lifetime: u64) -> Result<String> {
        let now = unix_now()?;
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + lifetime,
            token_type,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Access, self.config.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Generate both tokens for a user
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.generate_access_token(user)?,
            refresh: self.generate_refresh_token(user)?,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be of the given type
    pub fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            anyhow::bail!("Expected {:?} token, got {:?}", expected, claims.token_type);
        }
        Ok(claims)
    }

    /// Check if a token id is blacklisted in Redis
    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<bool> {
        Ok(redis_pool.exists(&blacklist_key(&claims.jti)).await?)
    }

    /// Blacklist a token for the rest of its lifetime
    pub async fn blacklist_token(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<()> {
        let ttl = claims.remaining_lifetime()?;
        redis_pool
            .set(&blacklist_key(&claims.jti), "1", Some(ttl))
            .await?;
        info!(user_id = claims.sub, "Token revoked");
        Ok(())
    }

    /// Revoke a token unless it already is
    ///
    /// Returns `false` when another caller revoked it first.
    pub async fn revoke_once(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<bool> {
        let ttl = claims.remaining_lifetime()?;
        Ok(redis_pool
            .set_nx(&blacklist_key(&claims.jti), "1", ttl)
            .await?)
    }

    /// Rotate a refresh token
    ///
    /// Revokes the old refresh token and issues a fresh pair. A token can be
    /// rotated once: `None` means it was already revoked.
    pub async fn rotate_refresh_token(
        &self,
        redis_pool: &RedisPool,
        user: &User,
        old_claims: &Claims,
    ) -> Result<Option<TokenPair>> {
        if old_claims.token_type != TokenType::Refresh {
            anyhow::bail!("Token is not a refresh token");
        }

        if old_claims.sub != user.id {
            anyhow::bail!("Token does not belong to user");
        }

        if !self.revoke_once(redis_pool, old_claims).await? {
            return Ok(None);
        }
        info!(user_id = old_claims.sub, "Refresh token rotated");

        self.issue_pair(user).map(Some)
    }
}

#[cfg(test)]
pub(crate) fn test_service() -> JwtService {
    JwtService::new(JwtConfig {
        private_key: include_str!("../fixtures/jwt_test_private.pem").to_string(),
        public_key: include_str!("../fixtures/jwt_test_public.pem").to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 604800,
    })
    .expect("test keys are valid")
}
