//! Book document schema
//!
//! Every book carries the principal that created it. `owner_id` is written
//! once at insert and is not part of any update document.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{PrincipalId, RecordId};

/// Collection name for books
pub const BOOK_COLLECTION: &str = "books";

/// Book document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BookDoc {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(default)]
    pub metadata: Metadata,

    pub owner_id: PrincipalId,

    pub title: String,

    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Already-validated field changes for a book.
///
/// `None` leaves the stored value untouched. The owner is not representable
/// here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.publication_year.is_none()
            && self.genre.is_none()
    }

    /// Apply the changes to an in-memory document
    pub fn apply_to(&self, book: &mut BookDoc) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(isbn) = &self.isbn {
            book.isbn = Some(isbn.clone());
        }
        if let Some(year) = self.publication_year {
            book.publication_year = Some(year);
        }
        if let Some(genre) = &self.genre {
            book.genre = Some(genre.clone());
        }
        book.metadata.touch();
    }

    /// Build the `$set` document for a MongoDB update
    pub fn to_set_document(&self) -> Document {
        let mut set = doc! { "metadata.updated_at": bson::DateTime::now() };
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(author) = &self.author {
            set.insert("author", author.as_str());
        }
        if let Some(isbn) = &self.isbn {
            set.insert("isbn", isbn.as_str());
        }
        if let Some(year) = self.publication_year {
            set.insert("publication_year", year);
        }
        if let Some(genre) = &self.genre {
            set.insert("genre", genre.as_str());
        }
        doc! { "$set": set }
    }
}

impl IntoIndexes for BookDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "owner_id": 1, "_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("owner_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for BookDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BookDoc {
        BookDoc {
            id: RecordId::new(),
            metadata: Metadata::new(),
            owner_id: PrincipalId::new(),
            title: "Dune".into(),
            author: "Herbert".into(),
            isbn: None,
            publication_year: Some(1965),
            genre: None,
        }
    }

    #[test]
    fn test_apply_only_provided_fields() {
        let mut book = sample();
        let owner = book.owner_id;
        let update = BookUpdate {
            genre: Some("Science Fiction".into()),
            ..Default::default()
        };

        update.apply_to(&mut book);

        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Herbert");
        assert_eq!(book.publication_year, Some(1965));
        assert_eq!(book.genre.as_deref(), Some("Science Fiction"));
        assert_eq!(book.owner_id, owner);
    }

    #[test]
    fn test_set_document_never_touches_owner() {
        let update = BookUpdate {
            title: Some("Dune Messiah".into()),
            publication_year: Some(1969),
            ..Default::default()
        };

        let set = update.to_set_document();
        let fields = set.get_document("$set").unwrap();

        assert_eq!(fields.get_str("title").unwrap(), "Dune Messiah");
        assert_eq!(fields.get_i32("publication_year").unwrap(), 1969);
        assert!(!fields.contains_key("owner_id"));
        assert!(!fields.contains_key("author"));
        assert!(fields.contains_key("metadata.updated_at"));
    }

    #[test]
    fn test_owner_serializes_as_object_id() {
        let book = sample();
        let doc = bson::to_document(&book).unwrap();
        assert_eq!(
            doc.get_object_id("owner_id").unwrap(),
            book.owner_id.as_object_id()
        );
        assert_eq!(doc.get_object_id("_id").unwrap(), book.id.as_object_id());
    }
}
