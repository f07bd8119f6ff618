//! AbuseIPDB: crowd-sourced IP abuse reports.
//!
//! IP addresses use `/api/v2/check`; domains fall back to `/api/v2/check-block`,
//! which only reports an aggregate abuse confidence.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ProviderError;
use crate::http;
use crate::provider::{LookupResponse, ThreatProvider};
use crate::types::{Indicator, IndicatorKind, Metrics, SourceKind};

/// Report window requested from the API.
const MAX_AGE_IN_DAYS: &str = "90";

/// Connection settings for [`AbuseIpDbProvider`].
#[derive(Debug, Clone)]
pub struct AbuseIpDbConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl AbuseIpDbConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.abuseipdb.com";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for AbuseIpDbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Reputation-confidence provider backed by AbuseIPDB.
pub struct AbuseIpDbProvider {
    config: AbuseIpDbConfig,
}

impl AbuseIpDbProvider {
    pub const NAME: &'static str = "abuseipdb";

    pub fn new(config: AbuseIpDbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ThreatProvider for AbuseIpDbProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> SourceKind {
        SourceKind::ReputationConfidence
    }

    fn supports(&self, kind: IndicatorKind) -> bool {
        matches!(kind, IndicatorKind::IpAddress | IndicatorKind::Domain)
    }

    fn is_configured(&self) -> bool {
        super::has_key(&self.config.api_key)
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn lookup(&self, indicator: &Indicator) -> Result<LookupResponse, ProviderError> {
        let (path, param) = match indicator.kind() {
            IndicatorKind::IpAddress => ("check", "ipAddress"),
            IndicatorKind::Domain => ("check-block", "network"),
            other => {
                return Err(ProviderError::Unsupported(format!(
                    "abuseipdb cannot look up {other}"
                )))
            }
        };
        let url = http::endpoint(&self.config.base_url, &["api", "v2", path])?;

        let client = http::build_client(self.config.timeout)?;
        let request = client
            .get(url)
            .header("Key", self.config.api_key.as_deref().unwrap_or_default())
            .header("Accept", "application/json")
            .query(&[
                (param, indicator.normalized()),
                ("maxAgeInDays", MAX_AGE_IN_DAYS),
            ]);

        match http::fetch_json(request).await? {
            Some(body) => parse_check(body),
            None => Ok(LookupResponse::NotFound { raw: Value::Null }),
        }
    }
}

/// Normalize a check or check-block body.
///
/// A missing `data` object is a parse failure, not "not found".
pub(crate) fn parse_check(body: Value) -> Result<LookupResponse, ProviderError> {
    let data = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => return Err(ProviderError::Parse("response has no data object".into())),
    };

    let mut metrics = Metrics::new();
    if let Some(score) = data.get("abuseConfidenceScore").and_then(Value::as_f64) {
        metrics = metrics.with_number("abuse_confidence", score);
    }
    for (field, key) in [
        ("isTor", "is_tor"),
        ("isVpn", "is_vpn"),
        ("isProxy", "is_proxy"),
        ("isPublic", "is_public"),
    ] {
        if let Some(flag) = data.get(field).and_then(Value::as_bool) {
            metrics = metrics.with_flag(key, flag);
        }
    }

    let raw = data.clone();
    Ok(LookupResponse::Found { metrics, raw })
}
