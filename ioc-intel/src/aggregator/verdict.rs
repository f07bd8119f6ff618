//! Verdict decision and the one-line summary.

use crate::config::VerdictThresholds;
use crate::types::Verdict;

/// Maximum number of key findings quoted in a summary.
pub const MAX_FINDINGS: usize = 3;

/// Map a threat score and confidence to a verdict.
///
/// Rules are evaluated in order, see [`VerdictThresholds`]. For a fixed
/// confidence the result never moves towards benign as the threat rises.
pub fn determine_verdict(threat: f64, confidence: f64, thresholds: &VerdictThresholds) -> Verdict {
    if confidence < thresholds.min_confidence {
        Verdict::Unknown
    } else if threat >= thresholds.malicious {
        Verdict::Malicious
    } else if threat >= thresholds.suspicious {
        Verdict::Suspicious
    } else if threat <= thresholds.benign_max && confidence >= thresholds.benign_min_confidence {
        Verdict::Benign
    } else {
        Verdict::Unknown
    }
}

/// Build the human-readable summary line.
///
/// ```text
/// Verdict: MALICIOUS | Threat Score: 71.9/100 | Confidence: 87.5% | Sources: abuseipdb, otx | Key findings: ...
/// ```
///
/// The sources and findings segments are omitted when empty.
pub fn summarize(
    verdict: Verdict,
    threat: f64,
    confidence: f64,
    sources: &[&str],
    findings: &[String],
) -> String {
    let mut parts = vec![
        format!("Verdict: {verdict}"),
        format!("Threat Score: {threat:.1}/100"),
        format!("Confidence: {:.1}%", confidence * 100.0),
    ];
    if !sources.is_empty() {
        parts.push(format!("Sources: {}", sources.join(", ")));
    }
    if !findings.is_empty() {
        let quoted: Vec<&str> = findings
            .iter()
            .take(MAX_FINDINGS)
            .map(String::as_str)
            .collect();
        parts.push(format!("Key findings: {}", quoted.join("; ")));
    }
    parts.join(" | ")
}
