//! Evidence aggregation: provider outcomes in, one verdict out.
//!
//! # Pipeline
//!
//! 1. Order outcomes by provider name so the result does not depend on map order
//! 2. Score each `Success` outcome with its family's function ([`scoring`])
//! 3. Fuse sub-scores by weight and compute confidence ([`fusion`])
//! 4. Decide the verdict and build the summary ([`verdict`])
//!
//! `NotFound` and `Failed` outcomes contribute no score, but still count as
//! eligible providers and so lower confidence.

pub mod fusion;
pub mod scoring;
pub mod verdict;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::AnalysisConfig;
use crate::types::{Outcomes, ProviderOutcome, VerdictResult};

/// Combine provider outcomes into a single [`VerdictResult`].
///
/// Pure and deterministic: equal outcome maps always produce equal results.
pub fn aggregate(outcomes: &Outcomes, config: &AnalysisConfig) -> VerdictResult {
    let mut ordered: Vec<(&String, &ProviderOutcome)> = outcomes.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));
    let eligible = ordered.len();

    let mut evidence = Vec::new();
    let mut tags = BTreeSet::new();
    let mut per_provider_scores = BTreeMap::new();
    let mut weighted = Vec::new();
    let mut qualities = Vec::new();
    let mut sources = Vec::new();
    let mut findings = Vec::new();

    for (name, outcome) in ordered {
        debug_assert_eq!(name, &outcome.provider, "outcome keyed under a different name");
        if !outcome.is_success() {
            continue;
        }

        let assessment =
            scoring::assess(name, outcome.source, &outcome.metrics, &config.scoring);
        per_provider_scores.insert(name.clone(), assessment.score);
        weighted.push((assessment.score, config.weight_for(name, outcome.source)));
        qualities.push(assessment.quality);
        sources.push(name.as_str());
        tags.extend(assessment.tags);
        evidence.extend(assessment.evidence);
        findings.extend(assessment.finding);
    }

    let threat_score = fusion::weighted_threat_score(&weighted);
    let confidence_score = fusion::confidence_score(eligible, &qualities);
    let verdict = verdict::determine_verdict(threat_score, confidence_score, &config.thresholds);
    let summary = verdict::summarize(verdict, threat_score, confidence_score, &sources, &findings);

    tracing::debug!(
        verdict = %verdict,
        threat_score,
        confidence_score,
        eligible,
        successful = qualities.len(),
        "aggregated provider outcomes"
    );

    VerdictResult {
        verdict,
        threat_score,
        confidence_score,
        evidence,
        tags,
        summary,
        per_provider_scores,
    }
}
