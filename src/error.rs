//! OCPI core error types.
//!
//! Layer-specific errors ([`ClientError`], [`StorageError`], [`AdapterError`],
//! [`HandshakeError`]) live next to the code that raises them. `OcpiError`
//! gathers them for callers that drive the crate as a whole (the binary,
//! configuration loading, server startup).

use thiserror::Error;

use crate::adapter::AdapterError;
use crate::client::ClientError;
use crate::handshake::HandshakeError;
use crate::storage::StorageError;

/// OCPI core errors.
#[derive(Error, Debug)]
pub enum OcpiError {
    /// Credentials handshake failed.
    #[error("Handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Counterpart call failed.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Storage gateway failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Object adaptation failed.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Server-side error.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for OCPI operations
pub type Result<T> = std::result::Result<T, OcpiError>;

impl From<toml::de::Error> for OcpiError {
    fn from(err: toml::de::Error) -> Self {
        OcpiError::Config(err.to_string())
    }
}
