//! Core query orchestrator: one task per eligible provider, joined at a barrier.
//!
//! Each lookup is spawned onto the tokio scheduler and wrapped in its own
//! timeout. A slow, failing or panicking provider only affects its own
//! outcome; siblings are never cancelled.

use std::sync::Arc;

use crate::error::ProviderError;
use crate::provider::{LookupResponse, ThreatProvider};
use crate::types::{Indicator, Outcomes, ProviderOutcome};

/// Query every eligible provider concurrently.
///
/// # Pipeline
///
/// 1. Filter `providers` to those that support the indicator kind and are configured
/// 2. Spawn one task per eligible provider, each bounded by [`ThreatProvider::timeout`]
/// 3. Wait for every task with [`futures::future::join_all`]
/// 4. Convert errors, timeouts and panics into failed outcomes
///
/// Returns an empty map when no provider is eligible. Provider names must be
/// unique; [`Analyzer::new`](crate::Analyzer::new) enforces this.
pub async fn query(indicator: &Indicator, providers: &[Arc<dyn ThreatProvider>]) -> Outcomes {
    let kind = indicator.kind();

    // 1-2. Spawn eagerly so every lookup starts before we wait on any of them.
    let tasks: Vec<_> = providers
        .iter()
        .filter(|provider| provider.is_eligible(kind))
        .map(|provider| {
            let provider = Arc::clone(provider);
            let name = provider.name().to_owned();
            let source = provider.source();
            let indicator = indicator.clone();
            let handle = tokio::spawn(async move { run_lookup(provider.as_ref(), &indicator).await });
            async move {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(provider = %name, error = %err, "provider task aborted");
                        ProviderOutcome::failed(&name, source, format!("lookup task aborted: {err}"))
                    }
                };
                (name, outcome)
            }
        })
        .collect();

    tracing::debug!(kind = %kind, eligible = tasks.len(), "querying providers");

    // 3. Join barrier.
    futures::future::join_all(tasks).await.into_iter().collect()
}

/// Run a single bounded lookup and normalize the result into an outcome.
async fn run_lookup(provider: &dyn ThreatProvider, indicator: &Indicator) -> ProviderOutcome {
    let name = provider.name();
    let source = provider.source();
    let limit = provider.timeout();
    tracing::trace!(provider = name, indicator = indicator.normalized(), "lookup started");

    match tokio::time::timeout(limit, provider.lookup(indicator)).await {
        Ok(Ok(LookupResponse::Found { metrics, raw })) => {
            tracing::debug!(provider = name, metrics = metrics.len(), "provider returned data");
            ProviderOutcome::success(name, source, metrics, raw)
        }
        Ok(Ok(LookupResponse::NotFound { raw })) => {
            tracing::debug!(provider = name, "indicator not in provider dataset");
            ProviderOutcome::not_found(name, source, raw)
        }
        Ok(Err(err)) => {
            tracing::warn!(provider = name, error = %err, "provider lookup failed");
            ProviderOutcome::failed(name, source, err.to_string())
        }
        Err(_) => {
            let err = ProviderError::Timeout(format!("exceeded {}ms limit", limit.as_millis()));
            tracing::warn!(provider = name, error = %err, "provider lookup timed out");
            ProviderOutcome::failed(name, source, err.to_string())
        }
    }
}
