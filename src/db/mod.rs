//! MongoDB persistence for principals and books

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
