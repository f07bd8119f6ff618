//! Per-source threat sub-scores.
//!
//! Each scoring family maps its provider's normalized metrics onto a
//! `[0, 100]` sub-score with piecewise-linear bands, plus tags, evidence and
//! a data-quality factor. Bands are continuous at their edges.
//!
//! | Family | Input | Bands |
//! |---|---|---|
//! | detection ratio | `malicious_count / total_count` | `(0, low]→[0,40]`, `(low, high]→(40,80]`, `(high, 1]→(80,100]` |
//! | reputation | `abuse_confidence` 0–100 | `≤20→a`, `≤50→20..60`, `≤80→60..90`, `>80→90..100`, then flat anonymizer bonuses |
//! | community pulse | `pulse_count` | `≤10→0..30`, `≤50→30..60`, `≤100→60..80`, `>100→80..100`, then reputation bonus |
//! | scan activity | `scan_count` | `≤5→0..20`, `≤20→20..40`, `≤50→40..70`, `>50→70..100` |

use crate::config::ScoringConfig;
use crate::types::{ConfidenceLabel, EvidenceItem, Metrics, SourceKind};

/// Quality factor when the metrics scoring relies on were present.
pub const FULL_QUALITY: f64 = 1.0;
/// Quality factor when scoring had to fall back to defaults.
pub const PARTIAL_QUALITY: f64 = 0.5;

/// What one successful provider contributes to the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAssessment {
    /// Threat sub-score in `[0, 100]`.
    pub score: f64,
    pub tags: Vec<String>,
    pub evidence: Vec<EvidenceItem>,
    /// [`FULL_QUALITY`] or [`PARTIAL_QUALITY`].
    pub quality: f64,
    /// Notable finding for the summary line, if any.
    pub finding: Option<String>,
}

impl SourceAssessment {
    fn partial() -> Self {
        Self {
            score: 0.0,
            tags: Vec::new(),
            evidence: Vec::new(),
            quality: PARTIAL_QUALITY,
            finding: None,
        }
    }

    fn tag(&mut self, tag: &str) {
        self.tags.push(tag.to_owned());
    }
}

/// Score one provider's metrics according to its family.
pub fn assess(
    provider: &str,
    source: SourceKind,
    metrics: &Metrics,
    config: &ScoringConfig,
) -> SourceAssessment {
    let mut assessment = match source {
        SourceKind::DetectionRatio => detection_ratio(provider, metrics, config),
        SourceKind::ReputationConfidence => reputation(provider, metrics, config),
        SourceKind::CommunityPulse => community_pulse(provider, metrics, config),
        SourceKind::ScanActivity => scan_activity(provider, metrics),
    };
    assessment.score = assessment.score.clamp(0.0, 100.0);
    assessment
}

fn detection_ratio(provider: &str, metrics: &Metrics, config: &ScoringConfig) -> SourceAssessment {
    let mut a = SourceAssessment::partial();
    let malicious = metrics.number("malicious_count").unwrap_or(0.0).max(0.0);
    let total = metrics.number("total_count").unwrap_or(0.0);

    if total > 0.0 {
        a.quality = FULL_QUALITY;
        let ratio = (malicious / total).clamp(0.0, 1.0);
        let (low, high) = (config.detection_low_ratio, config.detection_high_ratio);

        if ratio > high {
            a.score = 80.0 + (ratio - high) / (1.0 - high) * 20.0;
            a.tag("high_malware_detection");
        } else if ratio > low {
            a.score = 40.0 + (ratio - low) / (high - low) * 40.0;
            a.tag("moderate_malware_detection");
        } else if ratio > 0.0 {
            a.score = ratio / low * 40.0;
            a.tag("low_malware_detection");
        } else {
            a.tag("clean");
        }

        a.evidence.push(EvidenceItem::new(
            provider,
            "malware_detection",
            format!("{malicious:.0}/{total:.0} engines flagged malicious"),
            ConfidenceLabel::High,
        ));
    }

    if malicious > 0.0 {
        a.finding = Some(format!("{malicious:.0} AV engines flagged malicious"));
    }
    a
}

fn reputation(provider: &str, metrics: &Metrics, config: &ScoringConfig) -> SourceAssessment {
    let mut a = SourceAssessment::partial();
    let reported = metrics.number("abuse_confidence");
    let abuse = reported.unwrap_or(0.0).clamp(0.0, 100.0);

    if abuse > 80.0 {
        a.score = 90.0 + (abuse - 80.0) * 0.5;
        a.tag("high_abuse_confidence");
    } else if abuse > 50.0 {
        a.score = 60.0 + (abuse - 50.0);
        a.tag("moderate_abuse_confidence");
    } else if abuse > 20.0 {
        a.score = 20.0 + (abuse - 20.0) * 4.0 / 3.0;
        a.tag("low_abuse_confidence");
    } else {
        a.score = abuse;
        a.tag("clean");
    }

    if metrics.flag("is_tor").unwrap_or(false) {
        a.score += config.tor_bonus;
        a.tag("tor_exit_node");
        a.evidence.push(EvidenceItem::new(
            provider,
            "network_anomaly",
            "Tor exit node detected",
            ConfidenceLabel::High,
        ));
    }
    if metrics.flag("is_vpn").unwrap_or(false) {
        a.score += config.vpn_bonus;
        a.tag("vpn_detected");
    }
    if metrics.flag("is_proxy").unwrap_or(false) {
        a.score += config.proxy_bonus;
        a.tag("proxy_detected");
    }

    if reported.is_some() {
        a.quality = FULL_QUALITY;
        a.evidence.push(EvidenceItem::new(
            provider,
            "reputation_score",
            format!("Abuse confidence: {abuse:.0}%"),
            ConfidenceLabel::Medium,
        ));
    }
    if abuse > 50.0 {
        a.finding = Some(format!("High abuse confidence ({abuse:.0}%)"));
    }
    a
}

fn community_pulse(provider: &str, metrics: &Metrics, config: &ScoringConfig) -> SourceAssessment {
    let mut a = SourceAssessment::partial();
    let reported = metrics.number("pulse_count");
    let pulses = reported.unwrap_or(0.0).max(0.0);
    let reputation = metrics.number("reputation").unwrap_or(0.0);

    if pulses > 100.0 {
        a.score = 80.0 + ((pulses - 100.0) * 0.1).min(20.0);
        a.tag("high_threat_activity");
    } else if pulses > 50.0 {
        a.score = 60.0 + (pulses - 50.0) * 0.4;
        a.tag("moderate_threat_activity");
    } else if pulses > 10.0 {
        a.score = 30.0 + (pulses - 10.0) * 0.75;
        a.tag("low_threat_activity");
    } else if pulses > 0.0 {
        a.score = pulses * 3.0;
        a.tag("minimal_threat_activity");
    } else {
        a.tag("clean");
    }

    if reputation < -50.0 {
        a.score += config.very_negative_reputation_bonus;
        a.tag("very_negative_reputation");
    } else if reputation < 0.0 {
        a.score += config.negative_reputation_bonus;
        a.tag("negative_reputation");
    }

    for tag in metrics.tags("tags").unwrap_or_default() {
        let tag = tag.trim();
        if !tag.is_empty() {
            a.tags.push(tag.to_lowercase().replace(' ', "_"));
        }
    }

    if reported.is_some() {
        a.quality = FULL_QUALITY;
        a.evidence.push(EvidenceItem::new(
            provider,
            "threat_activity",
            format!("{pulses:.0} threat reports"),
            ConfidenceLabel::Medium,
        ));
    }
    if pulses > 50.0 {
        a.finding = Some(format!("{pulses:.0} threat reports"));
    }
    a
}

fn scan_activity(provider: &str, metrics: &Metrics) -> SourceAssessment {
    let mut a = SourceAssessment::partial();
    let reported = metrics.number("scan_count");
    let scans = reported.unwrap_or(0.0).max(0.0);

    if scans > 50.0 {
        a.score = 70.0 + ((scans - 50.0) * 0.3).min(30.0);
        a.tag("high_scan_activity");
    } else if scans > 20.0 {
        a.score = 40.0 + (scans - 20.0);
        a.tag("moderate_scan_activity");
    } else if scans > 5.0 {
        a.score = 20.0 + (scans - 5.0) * 4.0 / 3.0;
        a.tag("low_scan_activity");
    } else if scans > 0.0 {
        a.score = scans * 4.0;
        a.tag("minimal_scan_activity");
    } else {
        a.tag("no_scan_history");
    }

    if reported.is_some() {
        a.quality = FULL_QUALITY;
        a.evidence.push(EvidenceItem::new(
            provider,
            "scan_activity",
            format!("{scans:.0} scans recorded"),
            ConfidenceLabel::Medium,
        ));
    }
    if scans > 20.0 {
        a.finding = Some(format!("{scans:.0} recent scans"));
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(source: SourceKind, metrics: Metrics) -> SourceAssessment {
        assess("test", source, &metrics, &ScoringConfig::default())
    }

    fn detection(malicious: f64, total: f64) -> SourceAssessment {
        score(
            SourceKind::DetectionRatio,
            Metrics::new()
                .with_number("malicious_count", malicious)
                .with_number("total_count", total),
        )
    }

    #[test]
    fn detection_ratio_band_edges_are_continuous() {
        assert!((detection(0.0, 100.0).score - 0.0).abs() < 1e-9);
        assert!((detection(20.0, 100.0).score - 40.0).abs() < 1e-9);
        assert!((detection(50.0, 100.0).score - 80.0).abs() < 1e-9);
        assert!((detection(100.0, 100.0).score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn detection_ratio_tags_follow_bands() {
        assert_eq!(detection(0.0, 70.0).tags, vec!["clean"]);
        assert_eq!(detection(5.0, 70.0).tags, vec!["low_malware_detection"]);
        assert_eq!(detection(15.0, 70.0).tags, vec!["moderate_malware_detection"]);
        assert_eq!(detection(60.0, 70.0).tags, vec!["high_malware_detection"]);
    }

    #[test]
    fn detection_ratio_moderate_band_value() {
        // 15/70 ≈ 0.214 sits just inside the moderate band.
        let a = detection(15.0, 70.0);
        let expected = 40.0 + (15.0 / 70.0 - 0.2) / 0.3 * 40.0;
        assert!((a.score - expected).abs() < 1e-9);
        assert_eq!(a.quality, FULL_QUALITY);
        assert_eq!(a.finding.as_deref(), Some("15 AV engines flagged malicious"));
        assert_eq!(a.evidence[0].description, "15/70 engines flagged malicious");
        assert_eq!(a.evidence[0].confidence, ConfidenceLabel::High);
    }

    #[test]
    fn detection_ratio_without_engines_is_partial_quality() {
        let a = detection(0.0, 0.0);
        assert_eq!(a.score, 0.0);
        assert_eq!(a.quality, PARTIAL_QUALITY);
        assert!(a.evidence.is_empty());
        assert!(a.tags.is_empty());
    }

    #[test]
    fn detection_ratio_caps_inconsistent_counts() {
        let a = detection(90.0, 70.0);
        assert!((a.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn reputation_bands() {
        let abuse = |v: f64| {
            score(
                SourceKind::ReputationConfidence,
                Metrics::new().with_number("abuse_confidence", v),
            )
            .score
        };
        assert!((abuse(0.0) - 0.0).abs() < 1e-9);
        assert!((abuse(20.0) - 20.0).abs() < 1e-9);
        assert!((abuse(50.0) - 60.0).abs() < 1e-9);
        assert!((abuse(80.0) - 90.0).abs() < 1e-9);
        assert!((abuse(85.0) - 92.5).abs() < 1e-9);
        assert!((abuse(100.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn reputation_anonymizer_bonuses_are_clamped() {
        let a = score(
            SourceKind::ReputationConfidence,
            Metrics::new()
                .with_number("abuse_confidence", 90.0)
                .with_flag("is_tor", true)
                .with_flag("is_vpn", true)
                .with_flag("is_proxy", true),
        );
        assert!((a.score - 100.0).abs() < 1e-9);
        assert!(a.tags.contains(&"tor_exit_node".to_owned()));
        assert!(a.tags.contains(&"vpn_detected".to_owned()));
        assert!(a.tags.contains(&"proxy_detected".to_owned()));
        assert!(a.evidence.iter().any(|e| e.category == "network_anomaly"));
    }

    #[test]
    fn reputation_tor_bonus_on_clean_address() {
        let a = score(
            SourceKind::ReputationConfidence,
            Metrics::new()
                .with_number("abuse_confidence", 0.0)
                .with_flag("is_tor", true),
        );
        assert!((a.score - 20.0).abs() < 1e-9);
        assert_eq!(a.quality, FULL_QUALITY);
        assert!(a.finding.is_none());
    }

    #[test]
    fn reputation_without_confidence_is_partial_quality() {
        let a = score(
            SourceKind::ReputationConfidence,
            Metrics::new().with_flag("is_proxy", true),
        );
        assert_eq!(a.quality, PARTIAL_QUALITY);
        assert!((a.score - 15.0).abs() < 1e-9);
    }

    #[test]
    fn pulse_bands_and_reputation_bonus() {
        let a = score(
            SourceKind::CommunityPulse,
            Metrics::new()
                .with_number("pulse_count", 45.0)
                .with_number("reputation", -60.0),
        );
        // 30 + 35 * 0.75 = 56.25, plus 20 for very negative reputation.
        assert!((a.score - 76.25).abs() < 1e-9);
        assert!(a.tags.contains(&"low_threat_activity".to_owned()));
        assert!(a.tags.contains(&"very_negative_reputation".to_owned()));
        assert!(a.finding.is_none());

        let a = score(
            SourceKind::CommunityPulse,
            Metrics::new()
                .with_number("pulse_count", 5.0)
                .with_number("reputation", -1.0),
        );
        assert!((a.score - 25.0).abs() < 1e-9);
        assert!(a.tags.contains(&"negative_reputation".to_owned()));
    }

    #[test]
    fn pulse_high_band_saturates() {
        let a = score(
            SourceKind::CommunityPulse,
            Metrics::new().with_number("pulse_count", 10_000.0),
        );
        assert!((a.score - 100.0).abs() < 1e-9);
        assert_eq!(a.finding.as_deref(), Some("10000 threat reports"));
    }

    #[test]
    fn pulse_provider_tags_are_normalized() {
        let a = score(
            SourceKind::CommunityPulse,
            Metrics::new()
                .with_number("pulse_count", 0.0)
                .with_tags("tags", vec!["Cobalt Strike".into(), "  ".into(), "C2".into()]),
        );
        assert!(a.tags.contains(&"cobalt_strike".to_owned()));
        assert!(a.tags.contains(&"c2".to_owned()));
        assert!(a.tags.contains(&"clean".to_owned()));
        assert_eq!(a.tags.len(), 3);
    }

    #[test]
    fn scan_activity_bands() {
        let scans = |v: f64| {
            score(
                SourceKind::ScanActivity,
                Metrics::new().with_number("scan_count", v),
            )
        };
        assert!((scans(0.0).score - 0.0).abs() < 1e-9);
        assert_eq!(scans(0.0).tags, vec!["no_scan_history"]);
        assert!((scans(5.0).score - 20.0).abs() < 1e-9);
        assert!((scans(20.0).score - 40.0).abs() < 1e-9);
        assert!((scans(50.0).score - 70.0).abs() < 1e-9);
        assert!((scans(1000.0).score - 100.0).abs() < 1e-9);
        assert_eq!(scans(30.0).finding.as_deref(), Some("30 recent scans"));
    }

    #[test]
    fn sub_scores_stay_in_range() {
        let config = ScoringConfig {
            tor_bonus: 500.0,
            ..Default::default()
        };
        let a = assess(
            "x",
            SourceKind::ReputationConfidence,
            &Metrics::new()
                .with_number("abuse_confidence", 100.0)
                .with_flag("is_tor", true),
            &config,
        );
        assert!((0.0..=100.0).contains(&a.score));
    }
}
