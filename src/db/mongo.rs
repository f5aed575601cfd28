//! MongoDB client and collection wrapper

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::db::schemas::Metadata;
use crate::types::BookshelfError;

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Handle on the bookshelf database
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect with short selection timeouts and ping before returning
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, BookshelfError> {
        info!(uri = %uri, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.app_name.get_or_insert_with(|| "bookshelf".to_string());

        let client = Client::with_options(options)?;
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BookshelfError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!(db = %db_name, "Connected to MongoDB");
        Ok(Self {
            client,
            db_name: db_name.to_owned(),
        })
    }

    /// Open `name` as a typed collection, creating its indexes first
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, BookshelfError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        let collection = MongoCollection {
            inner: self.client.database(&self.db_name).collection::<T>(name),
        };
        collection.ensure_indexes().await?;
        Ok(collection)
    }
}

/// A collection whose documents carry [`Metadata`] and declare their indexes
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    async fn ensure_indexes(&self) -> Result<(), BookshelfError> {
        let models: Vec<IndexModel> = T::into_indices()
            .into_iter()
            .map(|(keys, options)| IndexModel::builder().keys(keys).options(options).build())
            .collect();

        if !models.is_empty() {
            let created = self.inner.create_indexes(models).await?;
            debug!(
                collection = %self.inner.name(),
                indexes = ?created.index_names,
                "Indexes ensured"
            );
        }
        Ok(())
    }

    /// Insert `item` with fresh timestamps.
    ///
    /// Returns `Ok(None)` when a unique index rejects the document.
    pub async fn insert_one(&self, mut item: T) -> Result<Option<T>, BookshelfError> {
        *item.mut_metadata() = Metadata::new();

        match self.inner.insert_one(&item).await {
            Ok(_) => Ok(Some(item)),
            Err(e) if is_duplicate_key(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, BookshelfError> {
        Ok(self.inner.find_one(filter).await?)
    }

    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, BookshelfError> {
        let cursor = self.inner.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Apply `update` to the one matching document, returning the new version
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, BookshelfError> {
        Ok(self
            .inner
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?)
    }

    /// Remove the one matching document, returning what was removed
    pub async fn find_one_and_delete(&self, filter: Document) -> Result<Option<T>, BookshelfError> {
        Ok(self.inner.find_one_and_delete(filter).await?)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
