//! MongoDB store backends

use bson::doc;
use tracing::debug;

use super::{CredentialStore, OwnedRecordFilter, RecordStore};
use crate::db::schemas::{
    BookDoc, BookUpdate, PrincipalDoc, BOOK_COLLECTION, PRINCIPAL_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{BookshelfError, PrincipalId, Result};

/// Principals collection
#[derive(Clone)]
pub struct MongoPrincipalStore {
    collection: MongoCollection<PrincipalDoc>,
}

impl MongoPrincipalStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo.collection(PRINCIPAL_COLLECTION).await?,
        })
    }
}

#[async_trait::async_trait]
impl CredentialStore for MongoPrincipalStore {
    async fn create(&self, principal: PrincipalDoc) -> Result<Option<PrincipalDoc>> {
        // The unique email index is the source of truth; no pre-check race
        self.collection.insert_one(principal).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<PrincipalDoc>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<PrincipalDoc>> {
        self.collection
            .find_one(doc! { "_id": id.as_object_id() })
            .await
    }
}

/// Books collection
#[derive(Clone)]
pub struct MongoBookStore {
    collection: MongoCollection<BookDoc>,
}

impl MongoBookStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: mongo.collection(BOOK_COLLECTION).await?,
        })
    }
}

#[async_trait::async_trait]
impl RecordStore for MongoBookStore {
    async fn create(&self, book: BookDoc) -> Result<BookDoc> {
        let id = book.id;
        self.collection.insert_one(book).await?.ok_or_else(|| {
            BookshelfError::Database(format!("Duplicate book id {}", id))
        })
    }

    async fn find(&self, owner: PrincipalId) -> Result<Vec<BookDoc>> {
        self.collection
            .find_many(doc! { "owner_id": owner.as_object_id() })
            .await
    }

    async fn find_one(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>> {
        self.collection.find_one(filter.to_document()).await
    }

    async fn find_one_and_update(
        &self,
        filter: OwnedRecordFilter,
        update: BookUpdate,
    ) -> Result<Option<BookDoc>> {
        debug!(book_id = %filter.id, "findOneAndUpdate");
        self.collection
            .find_one_and_update(filter.to_document(), update.to_set_document())
            .await
    }

    async fn find_one_and_delete(&self, filter: OwnedRecordFilter) -> Result<Option<BookDoc>> {
        debug!(book_id = %filter.id, "findOneAndDelete");
        self.collection
            .find_one_and_delete(filter.to_document())
            .await
    }
}
