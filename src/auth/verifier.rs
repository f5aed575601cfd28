//! Server-side token guard
//!
//! Verification is pure: signature, shape and expiry are checked from the
//! token alone, with no store lookup. Issued tokens therefore stay valid until
//! they expire, even after logout.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::auth::clock::SharedClock;
use crate::auth::jwt::JwtKeys;
use crate::types::{BookshelfError, PrincipalId};

/// Identity attached to a request once its token has been verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub principal_id: PrincipalId,
}

/// Validates bearer tokens on incoming requests
#[derive(Clone)]
pub struct TokenVerifier {
    keys: JwtKeys,
    clock: SharedClock,
}

impl TokenVerifier {
    pub fn new(keys: JwtKeys, clock: SharedClock) -> Self {
        Self { keys, clock }
    }

    /// Verify a raw token against the current time
    pub fn verify(&self, raw: Option<&str>) -> Result<PrincipalId, BookshelfError> {
        self.verify_at(raw, self.clock.now())
    }

    /// Verify a raw token as of `now`.
    ///
    /// A token is accepted only while `now < expires_at`.
    pub fn verify_at(
        &self,
        raw: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PrincipalId, BookshelfError> {
        let raw = raw.ok_or(BookshelfError::MissingToken)?;
        let claims = self.keys.decode(raw)?;

        if now.timestamp_micros() >= claims.exp_us {
            return Err(BookshelfError::Expired);
        }

        claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| BookshelfError::MalformedToken)
    }

    /// Extract and verify the bearer token from an `Authorization` header value
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<AuthContext, BookshelfError> {
        let result = extract_bearer_token(auth_header).and_then(|raw| self.verify(raw));

        match result {
            Ok(principal_id) => Ok(AuthContext { principal_id }),
            Err(e) => {
                warn!(reason = %e, "Rejected bearer token");
                Err(e)
            }
        }
    }
}

/// Pull the token out of a `Bearer <token>` header value.
///
/// An absent header or empty token is `Ok(None)`; any other scheme is
/// malformed.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<&str>, BookshelfError> {
    let Some(header) = auth_header.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(None);
    };

    let Some((scheme, token)) = header.split_once(' ') else {
        return if header.eq_ignore_ascii_case("bearer") {
            Ok(None)
        } else {
            Err(BookshelfError::MalformedToken)
        };
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BookshelfError::MalformedToken);
    }

    let token = token.trim();
    Ok((!token.is_empty()).then_some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::{system_clock, FixedClock};
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret-that-is-at-least-32-characters-long", 3600).unwrap()
    }

    #[test]
    fn test_valid_token_yields_principal() {
        let verifier = TokenVerifier::new(keys(), system_clock());
        let principal = PrincipalId::new();
        let minted = keys().sign(principal, Utc::now()).unwrap();

        assert_eq!(verifier.verify(Some(&minted.token)).unwrap(), principal);
    }

    #[test]
    fn test_expiry_boundary() {
        let verifier = TokenVerifier::new(keys(), system_clock());
        let minted = keys().sign(PrincipalId::new(), Utc::now()).unwrap();

        let at_expiry = verifier.verify_at(Some(&minted.token), minted.expires_at);
        assert!(matches!(at_expiry, Err(BookshelfError::Expired)));

        let just_before = minted.expires_at - TimeDelta::microseconds(1);
        assert!(verifier.verify_at(Some(&minted.token), just_before).is_ok());

        let long_after = minted.expires_at + TimeDelta::days(1);
        assert!(matches!(
            verifier.verify_at(Some(&minted.token), long_after),
            Err(BookshelfError::Expired)
        ));
    }

    #[test]
    fn test_expired_by_injected_clock() {
        let issued = Utc::now() - TimeDelta::hours(2);
        let minted = keys().sign(PrincipalId::new(), issued).unwrap();
        let verifier = TokenVerifier::new(keys(), Arc::new(FixedClock(Utc::now())));

        assert!(matches!(
            verifier.verify(Some(&minted.token)),
            Err(BookshelfError::Expired)
        ));
    }

    #[test]
    fn test_missing_and_malformed() {
        let verifier = TokenVerifier::new(keys(), system_clock());

        assert!(matches!(verifier.verify(None), Err(BookshelfError::MissingToken)));
        assert!(matches!(
            verifier.verify(Some("not-a-jwt")),
            Err(BookshelfError::MalformedToken)
        ));
    }

    #[test]
    fn test_foreign_signature() {
        let forged = JwtKeys::new("attacker-secret-that-is-at-least-32-chars", 3600)
            .unwrap()
            .sign(PrincipalId::new(), Utc::now())
            .unwrap();
        let verifier = TokenVerifier::new(keys(), system_clock());

        assert!(matches!(
            verifier.verify(Some(&forged.token)),
            Err(BookshelfError::InvalidSignature)
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc123")).unwrap(), Some("abc123"));
        assert_eq!(extract_bearer_token(Some("bearer abc123")).unwrap(), Some("abc123"));

        assert_eq!(extract_bearer_token(None).unwrap(), None);
        assert_eq!(extract_bearer_token(Some("")).unwrap(), None);
        assert_eq!(extract_bearer_token(Some("Bearer ")).unwrap(), None);

        assert!(extract_bearer_token(Some("Basic abc123")).is_err());
        assert!(extract_bearer_token(Some("abc123")).is_err());
    }

    #[test]
    fn test_authenticate_header() {
        let verifier = TokenVerifier::new(keys(), system_clock());
        let principal = PrincipalId::new();
        let minted = keys().sign(principal, Utc::now()).unwrap();
        let header = format!("Bearer {}", minted.token);

        let ctx = verifier.authenticate(Some(&header)).unwrap();
        assert_eq!(ctx.principal_id, principal);

        assert!(matches!(
            verifier.authenticate(None),
            Err(BookshelfError::MissingToken)
        ));
    }
}
