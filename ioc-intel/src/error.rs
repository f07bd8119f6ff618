//! Error types for the ioc-intel crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or indicator values appear in
//! error messages.

/// Why a raw string could not be turned into an [`Indicator`](crate::types::Indicator).
///
/// This is the only error that aborts an analysis, and it is always raised
/// before any provider is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    /// The input was empty after trimming whitespace.
    #[error("indicator is empty")]
    Empty,

    /// The input matches more than one shape and none can be preferred,
    /// e.g. an IPv4-shaped string with out-of-range octets.
    #[error("indicator is ambiguous")]
    Ambiguous,

    /// The input matches no supported indicator shape.
    #[error("indicator type is unrecognized")]
    Unrecognized,
}

impl ClassificationError {
    /// Short machine-readable code: `"empty"`, `"ambiguous"` or `"unrecognized"`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ambiguous => "ambiguous",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Errors a single provider lookup can produce.
///
/// These never escape the orchestrator: each one is recorded as a
/// [`OutcomeState::Failed`](crate::types::OutcomeState::Failed) outcome.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// An HTTP request to the provider failed or returned an error status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The lookup did not finish within the provider's timeout.
    #[error("lookup timed out: {0}")]
    Timeout(String),

    /// The provider rejected the request because of rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider was asked about an indicator kind it cannot handle.
    #[error("unsupported indicator: {0}")]
    Unsupported(String),
}

/// Invalid analysis configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);

/// Convenience type alias for provider lookups.
pub type Result<T> = std::result::Result<T, ProviderError>;
