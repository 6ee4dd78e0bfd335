//! Error types for simval-core

use thiserror::Error;

/// Configuration error raised while building a pipeline
///
/// Once a pipeline is built, its operations cannot fail. Only
/// constructors return these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid range: max {max} is less than min {min}")]
    InvalidRange { min: i64, max: i64 },

    #[error("Invalid clock interval: must be greater than zero")]
    ZeroInterval,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
