//! Registration and token issuance
//!
//! The issuer is the only component that touches secret verifiers. It mints
//! tokens but keeps no record of them.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::clock::SharedClock;
use crate::auth::jwt::{IdentityToken, JwtKeys};
use crate::auth::password::{hash_secret, verify_against_dummy, verify_secret};
use crate::db::schemas::PrincipalDoc;
use crate::store::CredentialStore;
use crate::types::ids::hex;
use crate::types::{BookshelfError, PrincipalId, Result};

/// Public view of a principal; the verifier is never exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(with = "hex")]
    pub id: PrincipalId,
    pub email: String,
    pub name: String,
}

impl From<&PrincipalDoc> for Principal {
    fn from(doc: &PrincipalDoc) -> Self {
        Self {
            id: doc.id,
            email: doc.email.clone(),
            name: doc.name.clone(),
        }
    }
}

/// Trim and lower-case an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

/// Verifies secrets against the credential store and mints identity tokens
#[derive(Clone)]
pub struct TokenIssuer {
    store: Arc<dyn CredentialStore>,
    keys: JwtKeys,
    clock: SharedClock,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, keys: JwtKeys, clock: SharedClock) -> Self {
        Self { store, keys, clock }
    }

    /// Register a new principal, storing only a derived verifier
    pub async fn register(&self, name: &str, email: &str, secret: &str) -> Result<Principal> {
        let name = name.trim();
        let email = normalize_email(email);

        let missing: Vec<&str> = [
            ("name", name.is_empty()),
            ("email", email.is_empty()),
            ("secret", secret.is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();

        if !missing.is_empty() {
            return Err(BookshelfError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !looks_like_email(&email) {
            return Err(BookshelfError::Validation(
                "email must be a valid address".into(),
            ));
        }

        let verifier = hash_secret(secret)?;
        let doc = PrincipalDoc::new(email, name.to_string(), verifier);

        match self.store.create(doc).await? {
            Some(created) => {
                info!(principal_id = %created.id, "Registered new principal");
                Ok(Principal::from(&created))
            }
            None => Err(BookshelfError::DuplicateEmail),
        }
    }

    /// Check an email/secret pair and return the matching principal.
    ///
    /// Unknown email and wrong secret fail identically.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<Principal> {
        let email = normalize_email(email);

        let Some(doc) = self.store.find_by_email(&email).await? else {
            verify_against_dummy(secret);
            warn!("Login failed: unknown email");
            return Err(BookshelfError::InvalidCredentials);
        };

        if !verify_secret(secret, &doc.secret_verifier)? {
            warn!(principal_id = %doc.id, "Login failed: secret mismatch");
            return Err(BookshelfError::InvalidCredentials);
        }

        Ok(Principal::from(&doc))
    }

    /// Mint a token for an already authenticated principal
    pub fn mint(&self, principal_id: PrincipalId) -> Result<IdentityToken> {
        self.keys.sign(principal_id, self.clock.now())
    }

    /// Verify credentials and mint a token
    pub async fn issue(&self, email: &str, secret: &str) -> Result<IdentityToken> {
        let principal = self.authenticate(email, secret).await?;
        self.mint(principal.id)
    }

    /// Resolve a verified principal id back to its public record
    pub async fn whoami(&self, principal_id: PrincipalId) -> Result<Principal> {
        self.store
            .find_by_id(principal_id)
            .await?
            .map(|doc| Principal::from(&doc))
            .ok_or(BookshelfError::NotFound)
    }
}
