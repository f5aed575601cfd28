//! Identity token encoding
//!
//! Tokens are HS256 JWTs carrying the principal id and issue/expiry instants
//! in microseconds since the Unix epoch. The standard `exp` claim has only
//! second resolution, so expiry is checked by [`TokenVerifier`] against
//! `exp_us` instead of by `jsonwebtoken` itself.
//!
//! [`TokenVerifier`]: crate::auth::TokenVerifier

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::types::{BookshelfError, PrincipalId};

/// Minimum accepted length of the signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (one year)
pub const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Signing secret used in dev mode when none is configured
pub const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Payload stored in the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (hex ObjectId)
    pub sub: String,
    /// Issued at, microseconds since epoch
    pub iat_us: i64,
    /// Expires at, microseconds since epoch
    pub exp_us: i64,
}

/// A freshly minted token and the facts it asserts
#[derive(Debug, Clone)]
pub struct IdentityToken {
    pub token: String,
    pub principal_id: PrincipalId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signing and decoding keys plus the token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl JwtKeys {
    /// Build keys from a shared secret.
    ///
    /// Returns an error if the secret is shorter than [`MIN_SECRET_LEN`] or the
    /// lifetime is zero or longer than [`MAX_TTL_SECONDS`].
    pub fn new(secret: &str, ttl_seconds: u64) -> Result<Self, BookshelfError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(BookshelfError::Config(format!(
                "JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        let ttl = Some(ttl_seconds)
            .filter(|secs| (1..=MAX_TTL_SECONDS).contains(secs))
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                BookshelfError::Config(format!("Invalid token lifetime: {}s", ttl_seconds))
            })?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Keys for dev mode
    pub fn new_dev() -> Self {
        Self {
            encoding: EncodingKey::from_secret(DEV_SECRET.as_bytes()),
            decoding: DecodingKey::from_secret(DEV_SECRET.as_bytes()),
            ttl: TimeDelta::hours(24),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Sign a token for `principal_id` valid from `issued_at` for the configured lifetime
    pub fn sign(
        &self,
        principal_id: PrincipalId,
        issued_at: DateTime<Utc>,
    ) -> Result<IdentityToken, BookshelfError> {
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            BookshelfError::Internal(format!("Token expiry out of range for {}", issued_at))
        })?;
        let claims = Claims {
            sub: principal_id.to_hex(),
            iat_us: issued_at.timestamp_micros(),
            exp_us: expires_at.timestamp_micros(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| BookshelfError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IdentityToken {
            token,
            principal_id,
            issued_at,
            expires_at,
        })
    }

    /// Check the signature and shape of a token. Expiry is not checked here.
    pub fn decode(&self, token: &str) -> Result<Claims, BookshelfError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::InvalidSignature => BookshelfError::InvalidSignature,
                _ => BookshelfError::MalformedToken,
            })
    }
}
