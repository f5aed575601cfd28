//! Client-side error type
//!
//! Transport failures are kept apart from anything the server answered, so a
//! caller can tell "the server is down" from "the server said no".

use crate::routes::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Timeout, refused connection or other transport failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The bearer token was missing, invalid or expired
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    /// An authenticated call was attempted without a session
    #[error("Not logged in")]
    NotAuthenticated,
}

impl ClientError {
    /// Map a non-success response onto the error taxonomy
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.error.clone())
            .unwrap_or_else(|| body.to_string());
        let code = parsed.and_then(|e| e.code);

        match status.as_u16() {
            401 if code.as_deref() == Some("INVALID_CREDENTIALS") => Self::InvalidCredentials,
            401 => Self::Unauthorized,
            409 => Self::DuplicateEmail,
            400 => Self::Validation(message),
            404 => Self::NotFound,
            status => Self::Status { status, message },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":"Invalid credentials","code":"INVALID_CREDENTIALS"}"#;
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, body),
            ClientError::InvalidCredentials
        ));

        let body = r#"{"error":"Unauthorized","code":"UNAUTHORIZED"}"#;
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, body),
            ClientError::Unauthorized
        ));

        let body = r#"{"error":"Validation failed: Title and Author are required"}"#;
        match ClientError::from_status(StatusCode::BAD_REQUEST, body) {
            ClientError::Validation(msg) => assert!(msg.contains("Title")),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, "{}"),
            ClientError::DuplicateEmail
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, ""),
            ClientError::NotFound
        ));
    }

    #[test]
    fn test_unparsed_body_kept_in_message() {
        match ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream down") {
            ClientError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
