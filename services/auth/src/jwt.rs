//! JWT service for access token issuance
//!
//! Tokens are signed with RS256. Verification lives in
//! [`common::auth::TokenVerifier`] so both services check tokens the same way.

use anyhow::Result;
use common::auth::{Claims, load_pem};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::User;

/// Default access token lifetime: 24 hours
const DEFAULT_ACCESS_TOKEN_EXPIRY: u64 = 86_400;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Access token expiration time in seconds
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: PEM private key, or a path to one
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: access token expiry in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let private_key = load_pem("JWT_PRIVATE_KEY")?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRY);

        Ok(JwtConfig {
            private_key,
            access_token_expiry,
        })
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;

        Ok(JwtService {
            encoding_key,
            config,
        })
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.config.access_token_expiry,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
