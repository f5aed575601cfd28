//! Ownership-scoped book gateway
//!
//! Every single-record operation builds an [`OwnedRecordFilter`] from the
//! authenticated principal, so a book owned by someone else behaves exactly
//! like a book that does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::schemas::{BookDoc, BookUpdate, Metadata};
use crate::store::{OwnedRecordFilter, RecordStore};
use crate::types::ids::hex;
use crate::types::{BookshelfError, PrincipalId, RecordId, Result};

/// Payload for creating a book
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            author: Some(author.into()),
            ..Default::default()
        }
    }
}

/// Partial update payload.
///
/// Unknown keys such as `ownerId` or `userId` are dropped during
/// deserialization; the owner can never be changed through this type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Book as returned over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(with = "hex")]
    pub id: RecordId,
    #[serde(with = "hex")]
    pub owner_id: PrincipalId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<BookDoc> for Book {
    fn from(doc: BookDoc) -> Self {
        Self {
            id: doc.id,
            owner_id: doc.owner_id,
            title: doc.title,
            author: doc.author,
            isbn: doc.isbn,
            publication_year: doc.publication_year,
            genre: doc.genre,
            created_at: doc.metadata.created_at.map(|t| t.to_chrono()),
            updated_at: doc.metadata.updated_at.map(|t| t.to_chrono()),
        }
    }
}

/// Trim a text field, treating blank as absent
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct BookGateway {
    store: Arc<dyn RecordStore>,
}

impl BookGateway {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a book owned by `principal`
    pub async fn create(&self, principal: PrincipalId, payload: NewBook) -> Result<Book> {
        let (Some(title), Some(author)) = (trimmed(payload.title), trimmed(payload.author))
        else {
            return Err(BookshelfError::Validation(
                "Title and Author are required".into(),
            ));
        };

        let doc = BookDoc {
            id: RecordId::new(),
            metadata: Metadata::new(),
            owner_id: principal,
            title,
            author,
            isbn: trimmed(payload.isbn),
            publication_year: payload.publication_year,
            genre: trimmed(payload.genre),
        };

        let created = self.store.create(doc).await?;
        info!(book_id = %created.id, owner = %principal, "Book created");
        Ok(created.into())
    }

    /// All books owned by `principal`
    pub async fn list(&self, principal: PrincipalId) -> Result<Vec<Book>> {
        let books = self.store.find(principal).await?;
        debug!(owner = %principal, count = books.len(), "Listed books");
        Ok(books.into_iter().map(Book::from).collect())
    }

    pub async fn get(&self, principal: PrincipalId, id: RecordId) -> Result<Book> {
        self.store
            .find_one(OwnedRecordFilter::new(id, principal))
            .await?
            .map(Book::from)
            .ok_or(BookshelfError::NotFound)
    }

    /// Apply the provided fields to a book owned by `principal`
    pub async fn update(
        &self,
        principal: PrincipalId,
        id: RecordId,
        changes: BookChanges,
    ) -> Result<Book> {
        let update = validate_changes(changes)?;
        if update.is_empty() {
            return self.get(principal, id).await;
        }

        let updated = self
            .store
            .find_one_and_update(OwnedRecordFilter::new(id, principal), update)
            .await?
            .ok_or(BookshelfError::NotFound)?;

        info!(book_id = %id, owner = %principal, "Book updated");
        Ok(updated.into())
    }

    pub async fn delete(&self, principal: PrincipalId, id: RecordId) -> Result<()> {
        self.store
            .find_one_and_delete(OwnedRecordFilter::new(id, principal))
            .await?
            .ok_or(BookshelfError::NotFound)?;

        info!(book_id = %id, owner = %principal, "Book deleted");
        Ok(())
    }
}

fn validate_changes(changes: BookChanges) -> Result<BookUpdate> {
    let non_blank = |value: Option<String>, field: &str| -> Result<Option<String>> {
        match value {
            Some(v) => trimmed(Some(v))
                .map(Some)
                .ok_or_else(|| BookshelfError::Validation(format!("{field} cannot be empty"))),
            None => Ok(None),
        }
    };
    let title = non_blank(changes.title, "Title")?;
    let author = non_blank(changes.author, "Author")?;

    Ok(BookUpdate {
        title,
        author,
        isbn: trimmed(changes.isbn),
        publication_year: changes.publication_year,
        genre: trimmed(changes.genre),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBookStore;

    fn gateway() -> BookGateway {
        BookGateway::new(Arc::new(MemoryBookStore::new()))
    }

    #[tokio::test]
    async fn test_create_then_get_returns_payload_plus_ids() {
        let gw = gateway();
        let alice = PrincipalId::new();

        let payload = NewBook {
            isbn: Some(" 978-0441013593 ".into()),
            publication_year: Some(1965),
            ..NewBook::new("  Dune ", "Herbert")
        };
        let created = gw.create(alice, payload).await.unwrap();
        let fetched = gw.get(alice, created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.owner_id, alice);
        assert_eq!(fetched.title, "Dune");
        assert_eq!(fetched.author, "Herbert");
        assert_eq!(fetched.isbn.as_deref(), Some("978-0441013593"));
        assert_eq!(fetched.publication_year, Some(1965));
        assert!(fetched.created_at.is_some());
    }

    #[tokio::test]
    async fn test_create_requires_title_and_author() {
        let gw = gateway();
        let alice = PrincipalId::new();

        for payload in [
            NewBook::new("", "Herbert"),
            NewBook::new("Dune", "   "),
            NewBook::default(),
        ] {
            assert!(matches!(
                gw.create(alice, payload).await,
                Err(BookshelfError::Validation(_))
            ));
        }
        assert!(gw.list(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_principal_sees_not_found() {
        let gw = gateway();
        let alice = PrincipalId::new();
        let bob = PrincipalId::new();
        let book = gw.create(alice, NewBook::new("Dune", "Herbert")).await.unwrap();

        let changes = BookChanges {
            title: Some("Mine".into()),
            ..Default::default()
        };

        assert!(matches!(gw.get(bob, book.id).await, Err(BookshelfError::NotFound)));
        assert!(matches!(
            gw.update(bob, book.id, changes).await,
            Err(BookshelfError::NotFound)
        ));
        assert!(matches!(gw.delete(bob, book.id).await, Err(BookshelfError::NotFound)));
        assert!(gw.list(bob).await.unwrap().is_empty());

        let untouched = gw.get(alice, book.id).await.unwrap();
        assert_eq!(untouched.title, "Dune");
    }

    #[tokio::test]
    async fn test_update_applies_only_provided_fields() {
        let gw = gateway();
        let alice = PrincipalId::new();
        let book = gw.create(alice, NewBook::new("Dune", "Herbert")).await.unwrap();

        let changes: BookChanges = serde_json::from_value(serde_json::json!({
            "genre": "Science Fiction",
            "ownerId": PrincipalId::new().to_hex(),
            "userId": PrincipalId::new().to_hex(),
        }))
        .unwrap();

        let updated = gw.update(alice, book.id, changes).await.unwrap();
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.genre.as_deref(), Some("Science Fiction"));
        assert_eq!(updated.owner_id, alice);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let gw = gateway();
        let alice = PrincipalId::new();
        let book = gw.create(alice, NewBook::new("Dune", "Herbert")).await.unwrap();

        let err = gw
            .update(alice, book.id, BookChanges { title: Some("  ".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, BookshelfError::Validation(_)));
    }

    #[tokio::test]
    async fn test_second_delete_is_not_found() {
        let gw = gateway();
        let alice = PrincipalId::new();
        let book = gw.create(alice, NewBook::new("Dune", "Herbert")).await.unwrap();

        gw.delete(alice, book.id).await.unwrap();
        assert!(matches!(gw.delete(alice, book.id).await, Err(BookshelfError::NotFound)));
        assert!(matches!(gw.get(alice, book.id).await, Err(BookshelfError::NotFound)));
    }

    #[test]
    fn test_book_json_is_camel_case() {
        let doc = BookDoc {
            id: RecordId::new(),
            metadata: Metadata::new(),
            owner_id: PrincipalId::new(),
            title: "Dune".into(),
            author: "Herbert".into(),
            isbn: None,
            publication_year: Some(1965),
            genre: None,
        };
        let json = serde_json::to_value(Book::from(doc.clone())).unwrap();

        assert_eq!(json["id"], doc.id.to_hex());
        assert_eq!(json["ownerId"], doc.owner_id.to_hex());
        assert_eq!(json["publicationYear"], 1965);
        assert!(json.get("isbn").is_none());
        assert!(json["createdAt"].is_string());
    }
}
