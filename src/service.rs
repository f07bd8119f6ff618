//! The analysis service: analyzer, verdict cache and batch runner.

use std::time::Instant;

use futures::StreamExt;
use ioc_intel::{classify, Analyzer, Indicator};

use crate::cache::VerdictCache;
use crate::config::{BatchConfig, ScopeConfig};
use crate::error::{Result, ScopeError};
use crate::registry::{self, ProviderStatus};
use crate::report::{AnalysisReport, BatchReport, FailedIndicator};

/// Analyzes indicators against the configured providers.
pub struct IocScope {
    analyzer: Analyzer,
    cache: Option<VerdictCache>,
    batch: BatchConfig,
}

impl IocScope {
    /// Build the service from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn from_config(config: ScopeConfig) -> Result<Self> {
        config.validate()?;
        let providers = registry::build_providers(&config.providers);
        let analyzer = Analyzer::new(config.analysis, providers)?;
        let cache = config
            .cache
            .enabled
            .then(|| VerdictCache::new(&config.cache));
        Ok(Self::new(analyzer, cache, config.batch))
    }

    pub fn new(analyzer: Analyzer, cache: Option<VerdictCache>, batch: BatchConfig) -> Self {
        Self {
            analyzer,
            cache,
            batch,
        }
    }

    /// Classify and analyze one indicator, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Classification`] if `raw` is not an indicator.
    pub async fn analyze(&self, raw: &str) -> Result<AnalysisReport> {
        let indicator = classify(raw)?;
        Ok(self.analyze_indicator(&indicator).await)
    }

    async fn analyze_indicator(&self, indicator: &Indicator) -> AnalysisReport {
        if let Some(cache) = &self.cache {
            if let Some(mut report) = cache.get(indicator).await {
                tracing::debug!(kind = %indicator.kind(), id = %report.id, "verdict cache hit");
                report.indicator = indicator.raw().trim().to_owned();
                report.cached = true;
                return report;
            }
        }

        let started = Instant::now();
        let outcomes = self.analyzer.query(indicator).await;
        let result = self.analyzer.aggregate(&outcomes);
        let report = AnalysisReport::new(indicator, result, &outcomes, started.elapsed());

        tracing::info!(
            kind = %report.kind,
            verdict = %report.result.verdict,
            threat_score = report.result.threat_score,
            confidence = report.result.confidence_score,
            duration_ms = report.duration_ms,
            "analysis complete"
        );
        tracing::trace!(indicator = indicator.normalized(), id = %report.id, "analyzed indicator");

        if let Some(cache) = &self.cache {
            cache.insert(indicator, report.clone()).await;
        }
        report
    }

    /// Analyze many indicators with bounded concurrency.
    ///
    /// Reports keep input order. Inputs that fail to classify are listed in
    /// [`BatchReport::failed`] and do not stop the batch.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Batch`] if `indicators` is empty or larger than
    /// `batch.max_indicators`.
    pub async fn analyze_batch(&self, indicators: Vec<String>) -> Result<BatchReport> {
        if indicators.is_empty() {
            return Err(ScopeError::Batch("no indicators supplied".into()));
        }
        if indicators.len() > self.batch.max_indicators {
            return Err(ScopeError::Batch(format!(
                "{} indicators exceeds the limit of {}",
                indicators.len(),
                self.batch.max_indicators
            )));
        }

        let started = Instant::now();
        tracing::info!(count = indicators.len(), "batch analysis started");

        let results: Vec<(String, Result<AnalysisReport>)> = futures::stream::iter(indicators)
            .map(|raw| async move {
                let result = self.analyze(&raw).await;
                (raw, result)
            })
            .buffered(self.batch.concurrency.max(1))
            .collect()
            .await;

        let mut reports = Vec::new();
        let mut failed = Vec::new();
        for (raw, result) in results {
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    let reason = match err {
                        ScopeError::Classification(e) => e.to_string(),
                        other => other.to_string(),
                    };
                    failed.push(FailedIndicator {
                        indicator: raw,
                        reason,
                    });
                }
            }
        }

        let batch = BatchReport::new(reports, failed, started.elapsed());
        tracing::info!(
            succeeded = batch.succeeded,
            failed = batch.failed.len(),
            duration_ms = batch.duration_ms,
            "batch analysis complete"
        );
        Ok(batch)
    }

    /// Status of every registered provider.
    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.analyzer
            .providers()
            .iter()
            .map(|provider| ProviderStatus::of(provider.as_ref()))
            .collect()
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}
