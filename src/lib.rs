//! Bookshelf - private book collections behind bearer-token authentication
//!
//! Registered principals manage their own book records over a JSON/HTTP API.
//! Every record operation is scoped to the verified bearer of the request, so
//! one principal's books are never visible to or mutable by another.
//!
//! ## Components
//!
//! - **Auth**: secret verifiers, token issuance and the bearer guard
//! - **Store**: principal and book persistence (MongoDB or in-memory)
//! - **Services**: the ownership-scoped book gateway
//! - **Server/Routes**: hyper HTTP server and JSON endpoints
//! - **Client**: HTTP client plus the persisted, observable session

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{BookshelfError, Result};
