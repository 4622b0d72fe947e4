//! NotifyMeOn error types

use thiserror::Error;

/// NotifyMeOn error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected user input (unknown event type, unknown filter kind, empty token)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Config backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chat platform API error
    #[error("Platform error: {0}")]
    Platform(String),

    /// Direct message could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for NotifyMeOn operations
pub type Result<T> = std::result::Result<T, Error>;
