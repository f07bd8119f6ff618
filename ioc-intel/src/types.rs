//! Core types: indicators, provider outcomes, evidence and verdicts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// The shape of an indicator of compromise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// An `http://` or `https://` URL.
    Url,
    /// A bare domain name such as `evil.example.com`.
    Domain,
    /// An IPv4 or IPv6 literal.
    IpAddress,
    /// 32 hex characters.
    HashMd5,
    /// 40 hex characters.
    HashSha1,
    /// 64 hex characters.
    HashSha256,
    /// An email address.
    Email,
    /// No recognised shape. Never produced by a successful classification.
    Unknown,
}

impl IndicatorKind {
    /// Returns the stable snake_case name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Domain => "domain",
            Self::IpAddress => "ip_address",
            Self::HashMd5 => "hash_md5",
            Self::HashSha1 => "hash_sha1",
            Self::HashSha256 => "hash_sha256",
            Self::Email => "email",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this kind is one of the file hash kinds.
    pub fn is_hash(&self) -> bool {
        matches!(self, Self::HashMd5 | Self::HashSha1 | Self::HashSha256)
    }

    /// Returns every kind a classification can produce.
    pub fn all() -> &'static [IndicatorKind] {
        &[
            Self::Url,
            Self::Domain,
            Self::IpAddress,
            Self::HashMd5,
            Self::HashSha1,
            Self::HashSha256,
            Self::Email,
        ]
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified indicator with its canonical lookup form.
///
/// Only [`classify`](crate::classifier::classify) creates these, so `normalized`
/// is always the output of [`normalize`](crate::classifier::normalize) for `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    raw: String,
    kind: IndicatorKind,
    normalized: String,
}

impl Indicator {
    pub(crate) fn new(raw: &str, kind: IndicatorKind, normalized: String) -> Self {
        Self {
            raw: raw.to_owned(),
            kind,
            normalized,
        }
    }

    /// The input exactly as the caller supplied it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The classified kind.
    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    /// The normalized value sent to providers.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Which scoring family a provider belongs to.
///
/// The aggregator dispatches sub-score computation on this closed set, so a
/// new provider only has to pick the family whose metrics it surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Multi-engine scanner reporting `malicious_count` out of `total_count`.
    DetectionRatio,
    /// Abuse-report database reporting `abuse_confidence` plus anonymizer flags.
    ReputationConfidence,
    /// Community threat exchange reporting `pulse_count`, `reputation` and `tags`.
    CommunityPulse,
    /// Sandbox/scanner history reporting `scan_count`.
    ScanActivity,
}

impl SourceKind {
    /// Returns the stable snake_case name of this family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DetectionRatio => "detection_ratio",
            Self::ReputationConfidence => "reputation_confidence",
            Self::CommunityPulse => "community_pulse",
            Self::ScanActivity => "scan_activity",
        }
    }

    /// Default fusion weight for providers of this family when the
    /// configuration names no explicit weight.
    pub fn default_weight(&self) -> f64 {
        match self {
            Self::DetectionRatio => 0.25,
            Self::ReputationConfidence => 0.30,
            Self::CommunityPulse => 0.30,
            Self::ScanActivity => 0.15,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a single provider lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeState {
    /// The provider returned data for the indicator.
    Success,
    /// The provider answered but has no record of the indicator.
    NotFound,
    /// Transport error, timeout, unparseable response or panic.
    Failed,
}

/// A single provider-specific metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Number(f64),
    Tags(Vec<String>),
}

/// Normalized metrics surfaced by a provider, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    /// Create an empty metric set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style numeric insert.
    pub fn with_number(mut self, key: &str, value: f64) -> Self {
        self.insert(key, MetricValue::Number(value));
        self
    }

    /// Builder-style boolean insert.
    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.insert(key, MetricValue::Flag(value));
        self
    }

    /// Builder-style tag list insert.
    pub fn with_tags(mut self, key: &str, tags: Vec<String>) -> Self {
        self.insert(key, MetricValue::Tags(tags));
        self
    }

    /// Insert or replace a metric.
    pub fn insert(&mut self, key: &str, value: MetricValue) {
        self.0.insert(key.to_owned(), value);
    }

    /// Numeric metric, if present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(MetricValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Boolean metric, if present and boolean.
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(MetricValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    /// Tag list metric, if present and a list.
    pub fn tags(&self, key: &str) -> Option<&[String]> {
        match self.0.get(key) {
            Some(MetricValue::Tags(tags)) => Some(tags),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The result of querying one provider during one analysis.
///
/// Created exactly once per eligible provider and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    /// Provider name; also the key of this outcome in [`Outcomes`].
    pub provider: String,
    /// Scoring family of the provider.
    pub source: SourceKind,
    pub state: OutcomeState,
    /// Normalized metrics. Always empty unless `state` is `Success`.
    pub metrics: Metrics,
    /// Opaque provider payload, or the error detail for failed lookups.
    pub raw_payload: serde_json::Value,
}

impl ProviderOutcome {
    pub fn success(
        provider: impl Into<String>,
        source: SourceKind,
        metrics: Metrics,
        raw_payload: serde_json::Value,
    ) -> Self {
        Self {
            provider: provider.into(),
            source,
            state: OutcomeState::Success,
            metrics,
            raw_payload,
        }
    }

    pub fn not_found(
        provider: impl Into<String>,
        source: SourceKind,
        raw_payload: serde_json::Value,
    ) -> Self {
        Self {
            provider: provider.into(),
            source,
            state: OutcomeState::NotFound,
            metrics: Metrics::new(),
            raw_payload,
        }
    }

    pub fn failed(provider: impl Into<String>, source: SourceKind, detail: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            source,
            state: OutcomeState::Failed,
            metrics: Metrics::new(),
            raw_payload: serde_json::Value::String(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == OutcomeState::Success
    }

    /// The error detail of a failed outcome.
    pub fn error(&self) -> Option<&str> {
        match self.state {
            OutcomeState::Failed => self.raw_payload.as_str(),
            _ => None,
        }
    }
}

/// Per-provider outcomes of one analysis, keyed by provider name.
///
/// Iteration order carries no meaning.
pub type Outcomes = HashMap<String, ProviderOutcome>;

/// How strongly a single evidence item should be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

/// A human-readable finding contributed by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Provider that produced the finding.
    pub source: String,
    /// Finding category, e.g. `malware_detection`.
    pub category: String,
    pub description: String,
    pub confidence: ConfidenceLabel,
}

impl EvidenceItem {
    pub fn new(
        source: &str,
        category: &str,
        description: impl Into<String>,
        confidence: ConfidenceLabel,
    ) -> Self {
        Self {
            source: source.to_owned(),
            category: category.to_owned(),
            description: description.into(),
            confidence,
        }
    }
}

/// Categorical conclusion of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Malicious,
    Suspicious,
    Benign,
    Unknown,
}

impl Verdict {
    /// Upper-case display name used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malicious => "MALICIOUS",
            Self::Suspicious => "SUSPICIOUS",
            Self::Benign => "BENIGN",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Position on the threat axis: benign < unknown < suspicious < malicious.
    pub fn threat_rank(&self) -> u8 {
        match self {
            Self::Benign => 0,
            Self::Unknown => 1,
            Self::Suspicious => 2,
            Self::Malicious => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal output of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictResult {
    pub verdict: Verdict,
    /// Weighted threat estimate in `[0, 100]`.
    pub threat_score: f64,
    /// How much evidence backs the threat score, in `[0, 1]`.
    pub confidence_score: f64,
    pub evidence: Vec<EvidenceItem>,
    pub tags: BTreeSet<String>,
    pub summary: String,
    /// Sub-scores of providers that returned `Success`, keyed by provider name.
    pub per_provider_scores: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_kind_names_match_serde() {
        for kind in IndicatorKind::all() {
            let json = serde_json::to_string(kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn indicator_kind_is_hash() {
        assert!(IndicatorKind::HashMd5.is_hash());
        assert!(IndicatorKind::HashSha1.is_hash());
        assert!(IndicatorKind::HashSha256.is_hash());
        assert!(!IndicatorKind::Domain.is_hash());
        assert!(!IndicatorKind::Unknown.is_hash());
    }

    #[test]
    fn all_kinds_excludes_unknown() {
        assert_eq!(IndicatorKind::all().len(), 7);
        assert!(!IndicatorKind::all().contains(&IndicatorKind::Unknown));
    }

    #[test]
    fn source_default_weights_are_positive() {
        for source in [
            SourceKind::DetectionRatio,
            SourceKind::ReputationConfidence,
            SourceKind::CommunityPulse,
            SourceKind::ScanActivity,
        ] {
            assert!(source.default_weight() > 0.0, "{source}");
        }
    }

    #[test]
    fn metrics_typed_getters() {
        let metrics = Metrics::new()
            .with_number("pulse_count", 12.0)
            .with_flag("is_tor", true)
            .with_tags("tags", vec!["botnet".into()]);

        assert_eq!(metrics.number("pulse_count"), Some(12.0));
        assert_eq!(metrics.flag("is_tor"), Some(true));
        assert_eq!(metrics.tags("tags").map(<[String]>::len), Some(1));
        // Wrong type reads as absent.
        assert_eq!(metrics.number("is_tor"), None);
        assert_eq!(metrics.flag("missing"), None);
        assert_eq!(metrics.len(), 3);
    }

    #[test]
    fn metrics_deserialize_untagged_values() {
        let metrics: Metrics =
            serde_json::from_str(r#"{"total_count": 70, "is_vpn": false, "tags": ["a", "b"]}"#)
                .expect("deserialize");
        assert_eq!(metrics.number("total_count"), Some(70.0));
        assert_eq!(metrics.flag("is_vpn"), Some(false));
        assert_eq!(metrics.tags("tags").map(<[String]>::len), Some(2));
    }

    #[test]
    fn failed_outcome_carries_error_detail() {
        let outcome = ProviderOutcome::failed("otx", SourceKind::CommunityPulse, "timed out");
        assert_eq!(outcome.state, OutcomeState::Failed);
        assert!(outcome.metrics.is_empty());
        assert_eq!(outcome.error(), Some("timed out"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn not_found_outcome_has_no_error() {
        let outcome =
            ProviderOutcome::not_found("urlscan", SourceKind::ScanActivity, serde_json::Value::Null);
        assert_eq!(outcome.state, OutcomeState::NotFound);
        assert_eq!(outcome.error(), None);
    }

    #[test]
    fn verdict_threat_rank_orders_categories() {
        assert!(Verdict::Benign.threat_rank() < Verdict::Unknown.threat_rank());
        assert!(Verdict::Unknown.threat_rank() < Verdict::Suspicious.threat_rank());
        assert!(Verdict::Suspicious.threat_rank() < Verdict::Malicious.threat_rank());
    }

    #[test]
    fn verdict_display_is_upper_case() {
        assert_eq!(Verdict::Malicious.to_string(), "MALICIOUS");
        assert_eq!(Verdict::Unknown.to_string(), "UNKNOWN");
    }
}
