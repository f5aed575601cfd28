//! Shared types for Bookshelf

mod error;
pub mod ids;

pub use error::{BookshelfError, Result};
pub use ids::{PrincipalId, RecordId};
