//! Secret hashing and verification using Argon2
//!
//! Uses the argon2id variant with the crate's recommended parameters. The
//! stored verifier is a PHC string carrying its own salt and parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

use crate::types::BookshelfError;

/// Derive a salted verifier for a secret
pub fn hash_secret(secret: &str) -> Result<String, BookshelfError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BookshelfError::Internal(format!("Failed to hash secret: {e}")))
}

/// Check a secret against a stored verifier
pub fn verify_secret(secret: &str, verifier: &str) -> Result<bool, BookshelfError> {
    let parsed = PasswordHash::new(verifier)
        .map_err(|e| BookshelfError::Internal(format!("Invalid secret verifier format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// Burn the same Argon2 work as a real verification.
///
/// Called when the email is unknown so a failed login costs the same whether
/// or not the account exists.
pub fn verify_against_dummy(secret: &str) {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    if let Some(verifier) = DUMMY.get_or_init(|| hash_secret("bookshelf-dummy-secret").ok()) {
        let _ = verify_secret(secret, verifier);
    }
}
