//! In-memory store backends
//!
//! Used by tests and by dev mode when MongoDB is unreachable. Each operation
//! holds the relevant lock for its whole duration, which gives the same
//! single-document atomicity MongoDB provides.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CredentialStore, OwnedRecordFilter, RecordStore};
use crate::db::schemas::{BookDoc, BookUpdate, Metadata, PrincipalDoc};
use crate::types::{PrincipalId, RecordId, Result};

/// Principals keyed by id with a unique email index
#[derive(Default)]
pub struct MemoryPrincipalStore {
    by_id: DashMap<PrincipalId, PrincipalDoc>,
    by_email: DashMap<String, PrincipalId>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryPrincipalStore {
    async fn create(&self, mut principal: PrincipalDoc) -> Result<Option<PrincipalDoc>> {
        match self.by_email.entry(principal.email.clone()) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                principal.metadata = Metadata::new();
                slot.insert(principal.id);
                self.by_id.insert(principal.id, principal.clone());
                Ok(Some(principal))
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalDoc>> {
        let Some(id) = self.by_email.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<PrincipalDoc>> {
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }
}

/// Books keyed by record id
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<HashMap<RecordId, BookDoc>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryBookStore {
    async fn create(&self, mut book: BookDoc) -> Result<BookDoc> {
        book.metadata = Metadata::new();
        self.books.write().await.insert(book.id, book.clone());
        Ok(book)
    }

    async fn find(&self, owner: PrincipalId) -> Result<Vec<BookDoc>> {
        let books = self.books.read().await;
        Ok(books
            .values()
            .filter(|book| book.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>> {
        let books = self.books.read().await;
        Ok(books
            .get(&filter.id)
            .filter(|book| filter.matches(book))
            .cloned())
    }

    async fn find_one_and_update(
        &self,
        filter: OwnedRecordFilter,
        update: BookUpdate,
    ) -> Result<Option<BookDoc>> {
        let mut books = self.books.write().await;
        Ok(books
            .get_mut(&filter.id)
            .filter(|book| filter.matches(book))
            .map(|book| {
                update.apply_to(book);
                book.clone()
            }))
    }

    async fn find_one_and_delete(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>> {
        let mut books = self.books.write().await;
        let owned = books
            .get(&filter.id)
            .map(|book| filter.matches(book))
            .unwrap_or(false);
        Ok(if owned { books.remove(&filter.id) } else { None })
    }
}
