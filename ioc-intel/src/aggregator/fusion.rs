//! Weighted fusion of provider sub-scores into one threat and confidence score.

/// Weighted average of `(score, weight)` pairs.
///
/// Weights are renormalized over the pairs present, so providers that did not
/// succeed simply drop out. Returns `0.0` when there are no pairs or every
/// weight is zero.
pub fn weighted_threat_score(scored: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = scored.iter().map(|(_, weight)| weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = scored.iter().map(|(score, weight)| score * weight).sum();
    (weighted / total_weight).clamp(0.0, 100.0)
}

/// Evidence confidence in `[0, 1]`.
///
/// Coverage (`successes / eligible`) averaged with the mean data quality of
/// the successful providers. Zero when nothing succeeded.
pub fn confidence_score(eligible: usize, qualities: &[f64]) -> f64 {
    if eligible == 0 || qualities.is_empty() {
        return 0.0;
    }
    let coverage = qualities.len() as f64 / eligible as f64;
    let quality = qualities.iter().sum::<f64>() / qualities.len() as f64;
    ((coverage + quality) / 2.0).clamp(0.0, 1.0)
}
