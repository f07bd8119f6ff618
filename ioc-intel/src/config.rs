//! Analysis configuration with sensible defaults.
//!
//! [`AnalysisConfig`] holds the static tuning the aggregator consumes:
//! per-provider fusion weights, scoring knobs and verdict thresholds.
//! Which providers exist and their credentials are supplied by the caller
//! when it builds the provider list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::SourceKind;

/// Per-provider lookup timeout used when a provider does not set its own.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration consumed by the aggregator.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Relative fusion weight by provider name. Providers not listed use
    /// [`SourceKind::default_weight`]. Weights need not sum to 1.
    pub weights: BTreeMap<String, f64>,
    /// Knobs of the per-source scoring functions.
    pub scoring: ScoringConfig,
    /// Verdict decision thresholds.
    pub thresholds: VerdictThresholds,
}

impl AnalysisConfig {
    /// Effective weight of a provider.
    pub fn weight_for(&self, provider: &str, source: SourceKind) -> f64 {
        self.weights
            .get(provider)
            .copied()
            .unwrap_or_else(|| source.default_weight())
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - every weight is finite and non-negative
    /// - scoring knobs (see [`ScoringConfig::validate`])
    /// - thresholds (see [`VerdictThresholds::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (provider, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError(format!(
                    "weight for {provider} must be a non-negative number"
                )));
            }
        }
        self.scoring.validate()?;
        self.thresholds.validate()
    }
}

/// Tunable constants of the per-source scoring functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Detection ratio at the top of the low band (sub-score 40).
    pub detection_low_ratio: f64,
    /// Detection ratio at the top of the moderate band (sub-score 80).
    pub detection_high_ratio: f64,
    /// Added to a reputation sub-score for Tor exit nodes.
    pub tor_bonus: f64,
    /// Added to a reputation sub-score for VPN endpoints.
    pub vpn_bonus: f64,
    /// Added to a reputation sub-score for open proxies.
    pub proxy_bonus: f64,
    /// Added to a pulse sub-score when community reputation is below zero.
    pub negative_reputation_bonus: f64,
    /// Added instead when community reputation is below -50.
    pub very_negative_reputation_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            detection_low_ratio: 0.2,
            detection_high_ratio: 0.5,
            tor_bonus: 20.0,
            vpn_bonus: 10.0,
            proxy_bonus: 15.0,
            negative_reputation_bonus: 10.0,
            very_negative_reputation_bonus: 20.0,
        }
    }
}

impl ScoringConfig {
    /// Checks `0 < detection_low_ratio < detection_high_ratio < 1` and that
    /// every bonus is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (low, high) = (self.detection_low_ratio, self.detection_high_ratio);
        if !(low > 0.0 && low < high && high < 1.0) {
            return Err(ConfigError(
                "detection ratio bands must satisfy 0 < low < high < 1".into(),
            ));
        }
        let bonuses = [
            ("tor_bonus", self.tor_bonus),
            ("vpn_bonus", self.vpn_bonus),
            ("proxy_bonus", self.proxy_bonus),
            ("negative_reputation_bonus", self.negative_reputation_bonus),
            (
                "very_negative_reputation_bonus",
                self.very_negative_reputation_bonus,
            ),
        ];
        for (name, value) in bonuses {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

/// Thresholds of the verdict decision, evaluated top to bottom.
///
/// ```text
/// confidence <  min_confidence                     → UNKNOWN
/// threat     >= malicious                          → MALICIOUS
/// threat     >= suspicious                         → SUSPICIOUS
/// threat     <= benign_max and
///   confidence >= benign_min_confidence            → BENIGN
/// otherwise                                        → UNKNOWN
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictThresholds {
    pub min_confidence: f64,
    pub malicious: f64,
    pub suspicious: f64,
    pub benign_max: f64,
    /// A clean score alone is not proof of innocence; below this confidence
    /// a low score stays UNKNOWN.
    pub benign_min_confidence: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            malicious: 70.0,
            suspicious: 40.0,
            benign_max: 20.0,
            benign_min_confidence: 0.5,
        }
    }
}

impl VerdictThresholds {
    /// Checks confidences lie in `[0, 1]` and
    /// `0 <= benign_max < suspicious < malicious <= 100`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("benign_min_confidence", self.benign_min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError(format!("{name} must be within [0, 1]")));
            }
        }
        let ordered = 0.0 <= self.benign_max
            && self.benign_max < self.suspicious
            && self.suspicious < self.malicious
            && self.malicious <= 100.0;
        if !ordered {
            return Err(ConfigError(
                "thresholds must satisfy 0 <= benign_max < suspicious < malicious <= 100".into(),
            ));
        }
        Ok(())
    }
}
