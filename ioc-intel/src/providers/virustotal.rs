//! VirusTotal: multi-engine antivirus scan reports.
//!
//! Uses the v2 report endpoints, which answer `response_code: 1` when the
//! resource is known and `0` otherwise.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ProviderError;
use crate::http;
use crate::provider::{LookupResponse, ThreatProvider};
use crate::types::{Indicator, IndicatorKind, Metrics, SourceKind};

/// Connection settings for [`VirusTotalProvider`].
#[derive(Debug, Clone)]
pub struct VirusTotalConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl VirusTotalConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.virustotal.com";

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

impl Default for VirusTotalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Detection-ratio provider backed by VirusTotal.
pub struct VirusTotalProvider {
    config: VirusTotalConfig,
}

impl VirusTotalProvider {
    pub const NAME: &'static str = "virustotal";

    pub fn new(config: VirusTotalConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ThreatProvider for VirusTotalProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> SourceKind {
        SourceKind::DetectionRatio
    }

    fn supports(&self, kind: IndicatorKind) -> bool {
        kind.is_hash()
            || matches!(
                kind,
                IndicatorKind::Url | IndicatorKind::Domain | IndicatorKind::IpAddress
            )
    }

    fn is_configured(&self) -> bool {
        super::has_key(&self.config.api_key)
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn lookup(&self, indicator: &Indicator) -> Result<LookupResponse, ProviderError> {
        let (section, param) = report_target(indicator.kind())?;
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let url = http::endpoint(&self.config.base_url, &["vtapi", "v2", section, "report"])?;

        let client = http::build_client(self.config.timeout)?;
        let request = client
            .get(url)
            .query(&[("apikey", api_key), (param, indicator.normalized())]);

        match http::fetch_json(request).await? {
            Some(body) => parse_report(body),
            None => Ok(LookupResponse::NotFound { raw: Value::Null }),
        }
    }
}

/// Report section and query parameter for an indicator kind.
fn report_target(kind: IndicatorKind) -> Result<(&'static str, &'static str), ProviderError> {
    match kind {
        k if k.is_hash() => Ok(("file", "resource")),
        IndicatorKind::Url => Ok(("url", "url")),
        IndicatorKind::Domain => Ok(("domain", "domain")),
        IndicatorKind::IpAddress => Ok(("ip-address", "ip")),
        other => Err(ProviderError::Unsupported(format!(
            "virustotal cannot look up {other}"
        ))),
    }
}

/// Normalize a v2 report body.
///
/// `positives` and `total` become `malicious_count` and `total_count` when
/// present; domain and IP reports omit them.
pub(crate) fn parse_report(body: Value) -> Result<LookupResponse, ProviderError> {
    if !body.is_object() {
        return Err(ProviderError::Parse("report is not a JSON object".into()));
    }
    if body.get("response_code").and_then(Value::as_i64) != Some(1) {
        return Ok(LookupResponse::NotFound { raw: body });
    }

    let mut metrics = Metrics::new();
    if let Some(positives) = body.get("positives").and_then(Value::as_f64) {
        metrics = metrics.with_number("malicious_count", positives);
    }
    if let Some(total) = body.get("total").and_then(Value::as_f64) {
        metrics = metrics.with_number("total_count", total);
    }
    Ok(LookupResponse::Found { metrics, raw: body })
}
