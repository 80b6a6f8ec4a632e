//! Error types for OWL

use thiserror::Error;

/// Main error type for OWL
#[derive(Error, Debug)]
pub enum OwlError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("World error: {0}")]
    World(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OwlError {
    /// Wrap a failure raised by a `World` implementation, keeping it as the source
    pub fn world<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::World(err.into())
    }
}

/// Result type alias for OWL operations
pub type Result<T> = std::result::Result<T, OwlError>;
