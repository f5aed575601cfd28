//! Document store seams for principals and books
//!
//! Handlers depend on these traits, not on MongoDB, so the same ownership
//! rules run against the in-memory backend in tests and dev mode.
//!
//! Every record operation that targets a single book takes an
//! [`OwnedRecordFilter`], which can only be built from both a record id and an
//! owner. There is no way to ask a store for a book by id alone.

mod memory;
mod mongo;

pub use memory::{MemoryBookStore, MemoryPrincipalStore};
pub use mongo::{MongoBookStore, MongoPrincipalStore};

use crate::db::schemas::{BookDoc, BookUpdate, PrincipalDoc};
use crate::types::{PrincipalId, RecordId, Result};

/// Compound `(id, owner)` equality filter for single-record operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedRecordFilter {
    pub id: RecordId,
    pub owner: PrincipalId,
}

impl OwnedRecordFilter {
    pub fn new(id: RecordId, owner: PrincipalId) -> Self {
        Self { id, owner }
    }

    pub fn matches(&self, book: &BookDoc) -> bool {
        book.id == self.id && book.owner_id == self.owner
    }

    pub fn to_document(&self) -> bson::Document {
        bson::doc! {
            "_id": self.id.as_object_id(),
            "owner_id": self.owner.as_object_id(),
        }
    }
}

/// Persistence for principals and their secret verifiers
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new principal. Returns `Ok(None)` if the email is taken.
    async fn create(&self, principal: PrincipalDoc) -> Result<Option<PrincipalDoc>>;

    /// Look up a principal by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalDoc>>;

    /// Look up a principal by id
    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<PrincipalDoc>>;
}

/// Persistence for owner-scoped book records
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, book: BookDoc) -> Result<BookDoc>;

    /// All books whose owner equals `owner`
    async fn find(&self, owner: PrincipalId) -> Result<Vec<BookDoc>>;

    async fn find_one(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>>;

    /// Apply `update` to the matching book and return it post-update
    async fn find_one_and_update(
        &self,
        filter: OwnedRecordFilter,
        update: BookUpdate,
    ) -> Result<Option<BookDoc>>;

    /// Remove the matching book and return what was removed
    async fn find_one_and_delete(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>>;
}
