//! Error types for iocscope.

use ioc_intel::{ClassificationError, ConfigError};

/// Top-level error type for the iocscope service and CLI.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Configuration file or settings error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a recognizable indicator.
    #[error("classification error: {0}")]
    Classification(#[from] ClassificationError),

    /// The analysis engine rejected its configuration.
    #[error(transparent)]
    Intel(#[from] ConfigError),

    /// Batch request rejected before any lookup.
    #[error("batch error: {0}")]
    Batch(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ScopeError>;
