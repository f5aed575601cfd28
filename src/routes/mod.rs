//! HTTP routes for Bookshelf

pub mod auth_routes;
pub mod books;
pub mod health;
pub mod response;

pub use auth_routes::{handle_auth_request, AuthResponse, LoginRequest, RegisterRequest};
pub use books::{handle_books_request, RESOURCES_PREFIX};
pub use health::{health_check, HealthResponse};
pub use response::{cors_preflight, not_found_response, BoxBody, ErrorResponse, MessageResponse};
