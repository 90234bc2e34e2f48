//! Crate-wide error type
//!
//! Only startup paths can fail: loading configuration, compiling forward
//! patterns, binding the listener and installing the logger. Request-time
//! failures are turned into HTTP status responses by the handlers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid forward pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logger initialization failed: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
