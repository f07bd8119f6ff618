//! Builds the provider list from configuration.

use std::sync::Arc;

use ioc_intel::providers::{
    AbuseIpDbConfig, AbuseIpDbProvider, OtxConfig, OtxProvider, UrlscanConfig, UrlscanProvider,
    VirusTotalConfig, VirusTotalProvider,
};
use ioc_intel::{IndicatorKind, SourceKind, ThreatProvider};
use serde::Serialize;

use crate::config::ProvidersConfig;

/// Instantiate every enabled built-in provider.
///
/// Missing credentials do not exclude a provider here; the orchestrator
/// skips it through [`ThreatProvider::is_configured`].
pub fn build_providers(config: &ProvidersConfig) -> Vec<Arc<dyn ThreatProvider>> {
    let default_timeout = config.timeout_seconds;
    let mut providers: Vec<Arc<dyn ThreatProvider>> = Vec::new();

    let settings = &config.virustotal;
    if settings.enabled {
        let mut vt = VirusTotalConfig::default().with_timeout(settings.timeout(default_timeout));
        vt.api_key.clone_from(&settings.api_key);
        if let Some(url) = &settings.base_url {
            vt = vt.with_base_url(url);
        }
        providers.push(Arc::new(VirusTotalProvider::new(vt)));
    }

    let settings = &config.abuseipdb;
    if settings.enabled {
        let mut abuse = AbuseIpDbConfig::default().with_timeout(settings.timeout(default_timeout));
        abuse.api_key.clone_from(&settings.api_key);
        if let Some(url) = &settings.base_url {
            abuse = abuse.with_base_url(url);
        }
        providers.push(Arc::new(AbuseIpDbProvider::new(abuse)));
    }

    let settings = &config.otx;
    if settings.enabled {
        let mut otx = OtxConfig::default().with_timeout(settings.timeout(default_timeout));
        otx.api_key.clone_from(&settings.api_key);
        if let Some(url) = &settings.base_url {
            otx = otx.with_base_url(url);
        }
        providers.push(Arc::new(OtxProvider::new(otx)));
    }

    let settings = &config.urlscan;
    if settings.enabled {
        let mut urlscan = UrlscanConfig::default().with_timeout(settings.timeout(default_timeout));
        urlscan.api_key.clone_from(&settings.api_key);
        if let Some(url) = &settings.base_url {
            urlscan = urlscan.with_base_url(url);
        }
        providers.push(Arc::new(UrlscanProvider::new(urlscan)));
    }

    tracing::debug!(count = providers.len(), "providers registered");
    providers
}

/// What a registered provider can do right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub source: SourceKind,
    pub configured: bool,
    pub supported_kinds: Vec<IndicatorKind>,
    pub timeout_seconds: u64,
}

impl ProviderStatus {
    pub fn of(provider: &dyn ThreatProvider) -> Self {
        Self {
            name: provider.name().to_owned(),
            source: provider.source(),
            configured: provider.is_configured(),
            supported_kinds: IndicatorKind::all()
                .iter()
                .copied()
                .filter(|kind| provider.supports(*kind))
                .collect(),
            timeout_seconds: provider.timeout().as_secs(),
        }
    }
}
