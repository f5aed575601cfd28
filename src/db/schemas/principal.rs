//! Principal document schema
//!
//! Stores a registered user's identity and salted secret verifier.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::PrincipalId;

/// Collection name for principals
pub const PRINCIPAL_COLLECTION: &str = "principals";

/// Principal document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PrincipalDoc {
    #[serde(rename = "_id")]
    pub id: PrincipalId,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Normalized (trimmed, lower-cased) email; unique
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2 PHC string; the raw secret is never stored
    pub secret_verifier: String,
}

impl PrincipalDoc {
    pub fn new(email: String, name: String, secret_verifier: String) -> Self {
        Self {
            id: PrincipalId::new(),
            metadata: Metadata::new(),
            email,
            name,
            secret_verifier,
        }
    }
}

impl IntoIndexes for PrincipalDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PrincipalDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
