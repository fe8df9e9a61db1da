//! Bearer-token primitives shared by the identity and incentive services
//!
//! The identity service signs RS256 access tokens; both services verify them
//! with [`TokenVerifier`] and turn the claims into an [`AuthUser`], the acting
//! identity every handler receives. Route allow-lists are checked with
//! [`authorize`].

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::TokenError;

/// Account tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Agent,
}

impl Role {
    /// Database and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Roles allowed to administer agents and approve their requests
pub const STAFF: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username at issue time
    pub username: String,
    /// Account tier
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Authenticated caller, as carried by a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Raised when the acting role is not on a route's allow-list
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Insufficient permissions")]
pub struct AccessDenied;

/// Permit the caller only if their role is in `allowed`
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), AccessDenied> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}

/// Extract the token from an `Authorization` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Read a PEM key from an environment variable holding either the PEM text
/// or a path to a PEM file
pub fn load_pem(var: &str) -> Result<String, TokenError> {
    let value =
        std::env::var(var).map_err(|_| TokenError::Key(format!("{} environment variable not set", var)))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    std::fs::read_to_string(&value)
        .map(|pem| pem.trim().to_string())
        .map_err(|e| TokenError::Key(format!("Failed to read key file {}: {}", value, e)))
}

/// Verifies RS256 access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM encoded RSA public key
    pub fn from_public_pem(public_key: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from `JWT_PUBLIC_KEY`
    pub fn from_env() -> Result<Self, TokenError> {
        Self::from_public_pem(&load_pem("JWT_PUBLIC_KEY")?)
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// RSA key fixtures for tests in dependent crates
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::{AuthUser, Claims, TokenVerifier};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/jwt_test_private.pem");
    pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/jwt_test_public.pem");

    /// Verifier paired with [`sign_token`]
    pub fn verifier() -> TokenVerifier {
        TokenVerifier::from_public_pem(TEST_PUBLIC_KEY).expect("test public key")
    }

    /// Sign a token for `user` that expires `ttl_seconds` from now
    pub fn sign_token_with_ttl(user: &AuthUser, ttl_seconds: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs() as i64;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now as u64,
            exp: (now + ttl_seconds).max(0) as u64,
        };

        let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).expect("test private key");
        encode(&Header::new(Algorithm::RS256), &claims, &key).expect("sign test token")
    }

    /// Sign a one-hour token for `user`
    pub fn sign_token(user: &AuthUser) -> String {
        sign_token_with_ttl(user, 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{sign_token, sign_token_with_ttl, verifier};
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "casey".to_string(),
            role,
        }
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Agent] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn authorize_checks_allow_list() {
        assert!(authorize(&user(Role::Admin), STAFF).is_ok());
        assert!(authorize(&user(Role::SuperAdmin), STAFF).is_ok());
        assert_eq!(authorize(&user(Role::Agent), STAFF), Err(AccessDenied));
        assert!(authorize(&user(Role::Agent), &[Role::Agent]).is_ok());
    }

    #[test]
    fn bearer_token_requires_scheme() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
    }

    #[test]
    fn verifier_accepts_signed_token() {
        let caller = user(Role::Agent);
        let claims = verifier().verify(&sign_token(&caller)).unwrap();

        assert_eq!(AuthUser::from(claims), caller);
    }

    #[test]
    fn verifier_rejects_expired_and_tampered_tokens() {
        let caller = user(Role::Admin);

        let expired = sign_token_with_ttl(&caller, -3600);
        assert!(matches!(verifier().verify(&expired), Err(TokenError::Invalid(_))));

        let mut tampered = sign_token(&caller);
        tampered.push('x');
        assert!(verifier().verify(&tampered).is_err());
    }
}
