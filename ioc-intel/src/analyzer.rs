//! End-to-end analysis: classify, query, aggregate.

use std::collections::HashSet;
use std::sync::Arc;

use crate::aggregator::aggregate;
use crate::classifier::classify;
use crate::config::AnalysisConfig;
use crate::error::{ClassificationError, ConfigError};
use crate::orchestrator::query;
use crate::provider::ThreatProvider;
use crate::types::{Indicator, Outcomes, VerdictResult};

/// A validated configuration bound to a fixed provider list.
///
/// Cheap to share behind an `Arc`; every analysis is independent and
/// nothing is cached between calls.
pub struct Analyzer {
    config: AnalysisConfig,
    providers: Vec<Arc<dyn ThreatProvider>>,
}

impl Analyzer {
    /// Validate `config` and bind it to `providers`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid or two
    /// providers share a name.
    pub fn new(
        config: AnalysisConfig,
        providers: Vec<Arc<dyn ThreatProvider>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.name()) {
                return Err(ConfigError(format!(
                    "duplicate provider name: {}",
                    provider.name()
                )));
            }
        }

        Ok(Self { config, providers })
    }

    /// Classify `raw` and analyze it.
    ///
    /// # Errors
    ///
    /// Only classification fails; provider problems lower confidence instead.
    pub async fn analyze(&self, raw: &str) -> Result<VerdictResult, ClassificationError> {
        let indicator = classify(raw)?;
        Ok(self.analyze_indicator(&indicator).await)
    }

    /// Analyze an already classified indicator.
    pub async fn analyze_indicator(&self, indicator: &Indicator) -> VerdictResult {
        let outcomes = self.query(indicator).await;
        aggregate(&outcomes, &self.config)
    }

    /// Run only the query stage, for callers that keep raw outcomes.
    pub async fn query(&self, indicator: &Indicator) -> Outcomes {
        query(indicator, &self.providers).await
    }

    /// Aggregate outcomes gathered by [`Analyzer::query`].
    pub fn aggregate(&self, outcomes: &Outcomes) -> VerdictResult {
        aggregate(outcomes, &self.config)
    }

    pub fn providers(&self) -> &[Arc<dyn ThreatProvider>] {
        &self.providers
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("providers", &names)
            .finish()
    }
}
