//! Error types for Bookshelf
//!
//! The first block of variants is the closed taxonomy every request-level
//! failure maps onto. The remaining variants are infrastructure failures that
//! never reach the caller verbatim.

use hyper::StatusCode;

/// Main error type for Bookshelf operations
#[derive(Debug, thiserror::Error)]
pub enum BookshelfError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Not found")]
    NotFound,

    #[error("Invalid id format: {0}")]
    InvalidId(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookshelfError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::MissingToken
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::Validation(_) | Self::InvalidId(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code included in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingToken
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::Expired => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidId(_) => "INVALID_ID",
            Self::Database(_) => "UNAVAILABLE",
            Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the caller.
    ///
    /// Token failures collapse to one message so the response never says which
    /// check failed; infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) | Self::InvalidId(_) | Self::DuplicateEmail => self.to_string(),
            Self::InvalidCredentials => "Invalid credentials".into(),
            Self::MissingToken
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::Expired => "Unauthorized".into(),
            Self::NotFound => "Not found".into(),
            Self::Database(_) => "Service unavailable".into(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".into(),
        }
    }

    /// True for the token-verification failures that short-circuit a request
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingToken | Self::MalformedToken | Self::InvalidSignature | Self::Expired
        )
    }
}

impl From<std::io::Error> for BookshelfError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<hyper::Error> for BookshelfError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for BookshelfError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for BookshelfError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON serialization error: {}", err))
    }
}

impl From<serde_json::Error> for BookshelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", err))
    }
}

/// Result type alias for Bookshelf operations
pub type Result<T> = std::result::Result<T, BookshelfError>;
