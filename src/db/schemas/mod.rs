//! Database schemas for Bookshelf
//!
//! Defines MongoDB document structures for principals and books.

mod book;
mod metadata;
mod principal;

pub use book::{BookDoc, BookUpdate, BOOK_COLLECTION};
pub use metadata::Metadata;
pub use principal::{PrincipalDoc, PRINCIPAL_COLLECTION};
