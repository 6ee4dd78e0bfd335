//! Error types for simval-trace

use thiserror::Error;

/// Trace export error type
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trace operations
pub type Result<T> = std::result::Result<T, Error>;
