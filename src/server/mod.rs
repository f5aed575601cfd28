//! HTTP server for Bookshelf

pub mod http;

pub use http::{run, serve, spawn, AppState};
