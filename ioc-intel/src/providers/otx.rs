//! AlienVault OTX: community threat pulses.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ProviderError;
use crate::http;
use crate::provider::{LookupResponse, ThreatProvider};
use crate::types::{Indicator, IndicatorKind, Metrics, SourceKind};

/// Connection settings for [`OtxProvider`].
#[derive(Debug, Clone)]
pub struct OtxConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl OtxConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://otx.alienvault.com";

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

impl Default for OtxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Community-pulse provider backed by the OTX indicator API.
pub struct OtxProvider {
    config: OtxConfig,
}

impl OtxProvider {
    pub const NAME: &'static str = "otx";

    pub fn new(config: OtxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ThreatProvider for OtxProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> SourceKind {
        SourceKind::CommunityPulse
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
        let section = indicator_section(indicator)?;
        let url = http::endpoint(
            &self.config.base_url,
            &["api", "v1", "indicators", section, indicator.normalized(), "general"],
        )?;

        let client = http::build_client(self.config.timeout)?;
        let request = client.get(url).header(
            "X-OTX-API-KEY",
            self.config.api_key.as_deref().unwrap_or_default(),
        );

        match http::fetch_json(request).await? {
            Some(body) => parse_general(body),
            None => Ok(LookupResponse::NotFound { raw: Value::Null }),
        }
    }
}

/// OTX indicator section; IPv4 and IPv6 live under separate paths.
fn indicator_section(indicator: &Indicator) -> Result<&'static str, ProviderError> {
    match indicator.kind() {
        k if k.is_hash() => Ok("file"),
        IndicatorKind::Url => Ok("url"),
        IndicatorKind::Domain => Ok("domain"),
        IndicatorKind::IpAddress if indicator.normalized().contains(':') => Ok("IPv6"),
        IndicatorKind::IpAddress => Ok("IPv4"),
        other => Err(ProviderError::Unsupported(format!("otx cannot look up {other}"))),
    }
}

/// Normalize a `general` section body.
///
/// `pulse_info.count` becomes `pulse_count` when present, alongside the
/// signed `reputation` and the indicator `tags`.
pub(crate) fn parse_general(body: Value) -> Result<LookupResponse, ProviderError> {
    if !body.is_object() {
        return Err(ProviderError::Parse("general section is not a JSON object".into()));
    }

    let mut metrics = Metrics::new();
    if let Some(count) = body
        .get("pulse_info")
        .and_then(|info| info.get("count"))
        .and_then(Value::as_f64)
    {
        metrics = metrics.with_number("pulse_count", count);
    }
    if let Some(reputation) = body.get("reputation").and_then(Value::as_f64) {
        metrics = metrics.with_number("reputation", reputation);
    }
    if let Some(tags) = body.get("tags").and_then(Value::as_array) {
        let tags: Vec<String> = tags
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect();
        metrics = metrics.with_tags("tags", tags);
    }

    Ok(LookupResponse::Found { metrics, raw: body })
}
