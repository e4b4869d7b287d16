//! JWT token issuing and verification

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (customer email)
    pub sub: String,
    /// Granted roles
    pub scopes: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl TokenClaims {
    /// Create new claims for a subject holding a single role
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<String>,
        issuer: impl Into<String>,
        expiration_hours: u64,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        let exp = token_expiry(now, expiration_hours)?;

        Ok(Self {
            sub: subject.into(),
            scopes: vec![role.into()],
            iss: issuer.into(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.sub
    }
}

/// Expiry of a token issued at `issued_at` that lives for `hours`
pub fn token_expiry(issued_at: DateTime<Utc>, hours: u64) -> Result<DateTime<Utc>, DomainError> {
    i64::try_from(hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            DomainError::configuration(format!("Token lifetime of {} hours is out of range", hours))
        })
}

/// Configuration for JWT service
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    pub secret: String,
    /// Value written to and required in the `iss` claim
    pub issuer: String,
    /// Token expiration time in hours
    pub expiration_hours: u64,
}

impl JwtConfig {
    /// Create new JWT configuration
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, expiration_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            expiration_hours,
        }
    }
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[hidden]")
            .field("issuer", &self.issuer)
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// Issues and verifies signed credentials
pub trait TokenIssuer: Send + Sync + Debug {
    /// Issue a token for a subject holding `role`
    fn issue(&self, subject: &str, role: &str) -> Result<String, DomainError>;

    /// Verify signature, expiry and issuer, returning the claims
    fn verify(&self, token: &str) -> Result<TokenClaims, DomainError>;

    /// Get the token expiration time in hours
    fn expiration_hours(&self) -> u64;
}

/// HS256 JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        validation
    }
}

impl TokenIssuer for JwtService {
    fn issue(&self, subject: &str, role: &str) -> Result<String, DomainError> {
        let claims = TokenClaims::new(
            subject,
            role,
            &self.config.issuer,
            self.config.expiration_hours,
        )?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DomainError::configuration(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, DomainError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))
    }

    fn expiration_hours(&self) -> u64 {
        self.config.expiration_hours
    }
}
