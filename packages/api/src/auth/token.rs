//! # Token service: signed, time-bounded identity assertions
//!
//! Tokens are HS256 JWTs carrying `{sub, email, iat, exp}`. They are never stored;
//! validity is decided purely from the signature and the `exp` claim, so there is no
//! server-side registry and no revocation before expiry.
//!
//! A token is valid while `now < exp`. At exactly `exp` it is already expired.
//!
//! The service is built from an immutable [`TokenConfig`]. An empty signing secret is
//! rejected at construction, which the server treats as a fatal startup error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default token lifetime: one day.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration errors that prevent the token service from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenConfigError {
    #[error("JWT signing secret is not configured")]
    MissingSecret,

    #[error("invalid token lifetime {0:?}: {1}")]
    InvalidLifetime(String, String),
}

/// Reasons a token fails to issue or validate.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Immutable token settings.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub lifetime: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Builder method to set the token lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

/// Parse a lifetime such as `"1d"`, `"12h"`, `"90m"` or a bare number of seconds.
pub fn parse_lifetime(value: &str) -> Result<Duration, TokenConfigError> {
    let value = value.trim();
    let invalid = |reason: String| TokenConfigError::InvalidLifetime(value.to_string(), reason);

    let lifetime = match value.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(value).map_err(|e| invalid(e.to_string()))?,
    };
    if lifetime.is_zero() {
        return Err(invalid("lifetime must be positive".to_string()));
    }
    Ok(lifetime)
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The identity a valid token asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: Uuid,
    pub email: String,
}

/// Issues and validates bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: chrono::Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Result<Self, TokenConfigError> {
        if config.secret.trim().is_empty() {
            return Err(TokenConfigError::MissingSecret);
        }
        let invalid = |reason: String| {
            TokenConfigError::InvalidLifetime(format!("{:?}", config.lifetime), reason)
        };
        let lifetime =
            chrono::Duration::from_std(config.lifetime).map_err(|e| invalid(e.to_string()))?;
        if Utc::now().checked_add_signed(lifetime).is_none() {
            return Err(invalid("expiry would be out of range".to_string()));
        }

        // Expiry is checked against an explicit clock in `validate_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    pub fn lifetime(&self) -> chrono::Duration {
        self.lifetime
    }

    /// Issue a token for `subject_id` expiring one lifetime from now.
    pub fn issue(&self, subject_id: Uuid, subject_email: &str) -> Result<String, TokenError> {
        self.issue_at(subject_id, subject_email, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject_id: Uuid,
        subject_email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
        let claims = Claims {
            sub: subject_id.to_string(),
            email: subject_email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<TokenSubject, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenSubject, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;
        let claims = data.claims;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|e| TokenError::Malformed(format!("invalid subject: {}", e)))?;

        Ok(TokenSubject {
            id,
            email: claims.email,
        })
    }
}
