//! urlscan.io: public sandbox scan history.
//!
//! Searching is allowed anonymously, so this provider is configured even
//! without an API key; a key only raises the rate limit.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DEFAULT_TIMEOUT_SECONDS;
use crate::error::ProviderError;
use crate::http;
use crate::provider::{LookupResponse, ThreatProvider};
use crate::types::{Indicator, IndicatorKind, Metrics, SourceKind};

/// Number of scans requested per search.
const SEARCH_SIZE: &str = "10";

/// Connection settings for [`UrlscanProvider`].
#[derive(Debug, Clone)]
pub struct UrlscanConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl UrlscanConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://urlscan.io";

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

impl Default for UrlscanConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

/// Scan-activity provider backed by the urlscan.io search API.
pub struct UrlscanProvider {
    config: UrlscanConfig,
}

impl UrlscanProvider {
    pub const NAME: &'static str = "urlscan";

    pub fn new(config: UrlscanConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ThreatProvider for UrlscanProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> SourceKind {
        SourceKind::ScanActivity
    }

    fn supports(&self, kind: IndicatorKind) -> bool {
        matches!(kind, IndicatorKind::Url | IndicatorKind::Domain)
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn lookup(&self, indicator: &Indicator) -> Result<LookupResponse, ProviderError> {
        let field = match indicator.kind() {
            IndicatorKind::Url => "url",
            IndicatorKind::Domain => "domain",
            other => {
                return Err(ProviderError::Unsupported(format!(
                    "urlscan cannot look up {other}"
                )))
            }
        };
        let query = search_query(field, indicator.normalized());
        let url = http::endpoint(&self.config.base_url, &["api", "v1", "search", ""])?;

        let client = http::build_client(self.config.timeout)?;
        let mut request = client
            .get(url)
            .query(&[("q", query.as_str()), ("size", SEARCH_SIZE)]);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            request = request.header("API-Key", key);
        }

        match http::fetch_json(request).await? {
            Some(body) => parse_search(body),
            None => Ok(LookupResponse::NotFound { raw: Value::Null }),
        }
    }
}

/// Exact-match search expression, e.g. `domain:"evil.example"`.
fn search_query(field: &str, value: &str) -> String {
    format!("{field}:\"{}\"", value.replace('"', "\\\""))
}

/// Normalize a search body. No results means "never scanned".
pub(crate) fn parse_search(body: Value) -> Result<LookupResponse, ProviderError> {
    let results = match body.get("results") {
        Some(Value::Array(results)) => results,
        Some(_) => return Err(ProviderError::Parse("results is not an array".into())),
        None if body.is_object() => return Ok(LookupResponse::NotFound { raw: body }),
        None => return Err(ProviderError::Parse("search body is not a JSON object".into())),
    };
    if results.is_empty() {
        return Ok(LookupResponse::NotFound { raw: body });
    }

    let metrics = Metrics::new().with_number("scan_count", results.len() as f64);
    Ok(LookupResponse::Found { metrics, raw: body })
}
