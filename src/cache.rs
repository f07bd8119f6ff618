//! In-memory verdict cache.
//!
//! Caches finished [`AnalysisReport`]s keyed by the (kind, normalized
//! indicator) pair, so `EVIL.example.com` and `evil.example.com` share an
//! entry. Uses [`moka`] for async-friendly caching with TTL and automatic
//! eviction. Each cache is owned by its service instance.

use std::time::Duration;

use ioc_intel::{Indicator, IndicatorKind};
use moka::future::Cache;

use crate::config::CacheConfig;
use crate::report::AnalysisReport;

/// Composite cache key: indicator kind + normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: IndicatorKind,
    value: String,
}

impl CacheKey {
    pub fn new(indicator: &Indicator) -> Self {
        Self {
            kind: indicator.kind(),
            value: indicator.normalized().to_owned(),
        }
    }
}

/// TTL-bounded store of recent reports.
#[derive(Clone)]
pub struct VerdictCache {
    inner: Cache<CacheKey, AnalysisReport>,
}

impl VerdictCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();
        Self { inner }
    }

    /// Look up a cached report for the indicator.
    ///
    /// Returns `Some(report)` on cache hit, `None` on miss.
    pub async fn get(&self, indicator: &Indicator) -> Option<AnalysisReport> {
        self.inner.get(&CacheKey::new(indicator)).await
    }

    pub async fn insert(&self, indicator: &Indicator, report: AnalysisReport) {
        self.inner.insert(CacheKey::new(indicator), report).await;
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
