//! Domain services sitting between the routes and the stores

pub mod books;

pub use books::{Book, BookChanges, BookGateway, NewBook};
