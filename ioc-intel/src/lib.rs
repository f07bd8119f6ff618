//! # ioc-intel
//!
//! Multi-source threat-intelligence verdicts for indicators of compromise.
//!
//! Classifies an IOC string (URL, domain, IP, file hash, email), queries
//! several threat-intelligence providers concurrently and fuses their
//! partial, heterogeneous answers into one verdict with a confidence score
//! and supporting evidence.
//!
//! ## Design
//!
//! - Classifier → orchestrator → aggregator, each usable on its own
//! - Providers are pluggable through [`ThreatProvider`]; four HTTP providers ship built in
//! - One task per provider with its own timeout; a failing provider never fails the analysis
//! - Aggregation is pure and independent of provider completion order
//! - No global state: caching and persistence belong to the caller
//!
//! ## Security
//!
//! - API keys never appear in errors or logs
//! - Indicator values are logged only at trace level

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod types;

use std::sync::Arc;

pub use analyzer::Analyzer;
pub use classifier::classify;
pub use config::{AnalysisConfig, ScoringConfig, VerdictThresholds};
pub use error::{ClassificationError, ConfigError, ProviderError};
pub use provider::{LookupResponse, ThreatProvider};
pub use types::{
    ConfidenceLabel, EvidenceItem, Indicator, IndicatorKind, MetricValue, Metrics, OutcomeState,
    Outcomes, ProviderOutcome, SourceKind, Verdict, VerdictResult,
};

/// Classify, query and aggregate in one call.
///
/// Configuration is not validated here; use [`Analyzer::new`] for that.
///
/// # Errors
///
/// Returns [`ClassificationError`] if `raw` is not a recognizable indicator.
/// Provider failures are reflected in the verdict's confidence, never as errors.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), ioc_intel::ClassificationError> {
/// use std::sync::Arc;
/// use ioc_intel::providers::{UrlscanConfig, UrlscanProvider};
///
/// let providers: Vec<Arc<dyn ioc_intel::ThreatProvider>> =
///     vec![Arc::new(UrlscanProvider::new(UrlscanConfig::default()))];
/// let config = ioc_intel::AnalysisConfig::default();
/// let result = ioc_intel::analyze("evil.example.com", &config, &providers).await?;
/// println!("{}", result.summary);
/// # Ok(())
/// # }
/// ```
pub async fn analyze(
    raw: &str,
    config: &AnalysisConfig,
    providers: &[Arc<dyn ThreatProvider>],
) -> Result<VerdictResult, ClassificationError> {
    let indicator = classify(raw)?;
    let outcomes = orchestrator::query(&indicator, providers).await;
    Ok(aggregator::aggregate(&outcomes, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn analyze_rejects_empty_input() {
        let result = analyze("", &AnalysisConfig::default(), &[]).await;
        assert_eq!(result.unwrap_err(), ClassificationError::Empty);
    }

    #[tokio::test]
    async fn analyze_without_providers_is_unknown() {
        let result = analyze("example.com", &AnalysisConfig::default(), &[])
            .await
            .expect("analysis");
        assert_eq!(result.verdict, Verdict::Unknown);
        assert!(result.summary.starts_with("Verdict: UNKNOWN"));
    }
}
