//! Consuming side of the API
//!
//! [`BookshelfClient`] mirrors every server endpoint. [`SessionHolder`] keeps
//! the token, persists it under [`TOKEN_KEY`] and publishes state changes.
//! [`AuthedClient`] ties the two together.

pub mod api;
pub mod error;
pub mod guard;
pub mod session;
pub mod storage;

pub use api::{AuthedClient, BookshelfClient};
pub use error::ClientError;
pub use guard::{GuardDecision, RouteGuard};
pub use session::{Navigation, SessionHolder, SessionState, LOGIN_PATH};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, TOKEN_KEY};
