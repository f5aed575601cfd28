//! Configuration for Bookshelf
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::auth::jwt::{DEV_SECRET, MAX_TTL_SECONDS};
use crate::auth::{JwtKeys, MIN_SECRET_LEN};
use crate::types::BookshelfError;

/// Which backend holds principals and books
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Mongo,
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Bookshelf - private book collections behind bearer-token authentication
#[derive(Parser, Debug, Clone)]
#[command(name = "bookshelf")]
#[command(about = "Per-user book collection API")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (built-in signing key, in-memory fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "bookshelf")]
    pub mongodb_db: String,

    /// Storage backend
    #[arg(long, env = "STORE", value_enum, default_value = "mongo")]
    pub store: StoreKind,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "16384")]
    pub max_body_bytes: usize,
}

impl Args {
    /// Arguments for an in-process server: dev mode, memory store, ephemeral port
    pub fn for_local_test() -> Self {
        Self {
            node_id: Uuid::new_v4(),
            listen: SocketAddr::from(([127, 0, 0, 1], 0)),
            dev_mode: true,
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "bookshelf".into(),
            store: StoreKind::Memory,
            jwt_secret: None,
            jwt_expiry_seconds: 86400,
            log_level: "info".into(),
            log_format: LogFormat::Text,
            max_body_bytes: 16 * 1024,
        }
    }

    /// Build signing keys from the configured secret.
    ///
    /// Dev mode without a secret falls back to the built-in dev key.
    pub fn jwt_keys(&self) -> Result<JwtKeys, BookshelfError> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => JwtKeys::new(secret, self.jwt_expiry_seconds),
            (None, true) => JwtKeys::new(DEV_SECRET, self.jwt_expiry_seconds),
            (None, false) => Err(BookshelfError::Config(
                "JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None if !self.dev_mode => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                ));
            }
            _ => {}
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if self.jwt_expiry_seconds > MAX_TTL_SECONDS {
            return Err(format!(
                "JWT_EXPIRY_SECONDS must be at most {} (one year)",
                MAX_TTL_SECONDS
            ));
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        if self.store == StoreKind::Memory && !self.dev_mode {
            return Err("STORE=memory is only allowed with DEV_MODE".to_string());
        }

        Ok(())
    }
}
