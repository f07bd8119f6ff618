//! Capability trait for pluggable threat-intelligence providers.
//!
//! Each source (VirusTotal, AbuseIPDB, OTX, urlscan.io, or a caller's own)
//! implements [`ThreatProvider`] and is handed to the orchestrator as an
//! `Arc<dyn ThreatProvider>` in a caller-supplied list.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ProviderError;
use crate::types::{Indicator, IndicatorKind, Metrics, SourceKind};

/// What a provider lookup found.
///
/// Absence of data is a normal answer, not an error: providers return
/// [`LookupResponse::NotFound`] when the indicator is not in their dataset
/// and reserve [`ProviderError`] for transport and parse failures.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResponse {
    /// The provider knows the indicator. `metrics` holds the normalized
    /// fields the provider's scoring family reads.
    Found {
        metrics: Metrics,
        raw: serde_json::Value,
    },
    /// The provider answered but has no record of the indicator.
    NotFound { raw: serde_json::Value },
}

/// A pluggable threat-intelligence source.
///
/// Implementors handle their own:
///
/// - request construction and authentication
/// - HTTP transport bounded by [`timeout`](ThreatProvider::timeout)
/// - normalization of the response into [`Metrics`]
///
/// All implementations must be `Send + Sync`; every lookup runs on its own
/// task concurrently with the other providers.
#[async_trait]
pub trait ThreatProvider: Send + Sync {
    /// Unique provider name, used as the key of its outcome.
    fn name(&self) -> &str;

    /// Scoring family used to turn this provider's metrics into a sub-score.
    fn source(&self) -> SourceKind;

    /// Whether the provider can look up indicators of this kind.
    fn supports(&self, kind: IndicatorKind) -> bool;

    /// Whether credentials and other required settings are present.
    fn is_configured(&self) -> bool {
        true
    }

    /// Upper bound on a single lookup. Expiry turns the lookup into a failed outcome.
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
    }

    /// Look up a classified indicator.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] for transport errors, rate limiting or
    /// unparseable responses. "Not found" is *not* an error.
    async fn lookup(&self, indicator: &Indicator) -> Result<LookupResponse, ProviderError>;

    /// Supported and configured: the orchestrator only invokes eligible providers.
    fn is_eligible(&self, kind: IndicatorKind) -> bool {
        self.supports(kind) && self.is_configured()
    }
}
