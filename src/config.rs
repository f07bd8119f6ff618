//! Configuration types for iocscope.
//!
//! Loaded from `~/.config/iocscope/config.toml`. Every section falls back
//! to defaults for missing fields, so an empty file is a valid config.
//! API keys may also come from the environment, which wins over the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ioc_intel::AnalysisConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScopeError};

/// Environment variables holding provider API keys.
pub const API_KEY_VARS: [(&str, &str); 4] = [
    ("virustotal", "VIRUSTOTAL_API_KEY"),
    ("abuseipdb", "ABUSEIPDB_API_KEY"),
    ("otx", "OTX_API_KEY"),
    ("urlscan", "URLSCAN_API_KEY"),
];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Fusion weights, scoring knobs and verdict thresholds.
    pub analysis: AnalysisConfig,
    pub providers: ProvidersConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

/// Built-in provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Lookup timeout for providers that do not set their own.
    pub timeout_seconds: u64,
    pub virustotal: ProviderSettings,
    pub abuseipdb: ProviderSettings,
    pub otx: ProviderSettings,
    pub urlscan: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: ioc_intel::config::DEFAULT_TIMEOUT_SECONDS,
            virustotal: ProviderSettings::default(),
            abuseipdb: ProviderSettings::default(),
            otx: ProviderSettings::default(),
            urlscan: ProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    /// Settings by provider name, in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ProviderSettings)> {
        [
            ("virustotal", &self.virustotal),
            ("abuseipdb", &self.abuseipdb),
            ("otx", &self.otx),
            ("urlscan", &self.urlscan),
        ]
        .into_iter()
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ProviderSettings> {
        match name {
            "virustotal" => Some(&mut self.virustotal),
            "abuseipdb" => Some(&mut self.abuseipdb),
            "otx" => Some(&mut self.otx),
            "urlscan" => Some(&mut self.urlscan),
            _ => None,
        }
    }
}

/// Settings for one built-in provider.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Disabled providers are never registered.
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Override of the provider's public API endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-provider timeout; falls back to `providers.timeout_seconds`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            timeout_seconds: None,
        }
    }
}

impl ProviderSettings {
    /// Effective lookup timeout.
    pub fn timeout(&self, default_seconds: u64) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(default_seconds))
    }
}

// API keys stay out of debug output.
impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Verdict cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// How long a report stays fresh.
    pub ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 1000,
        }
    }
}

/// Batch analysis limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Largest accepted batch.
    pub max_indicators: usize,
    /// Indicators analyzed at the same time.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_indicators: 100,
            concurrency: 4,
        }
    }
}

impl ScopeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ScopeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ScopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/iocscope/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("iocscope").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("iocscope")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/iocscope-config/config.toml")
        }
    }

    /// Resolve the configuration the CLI runs with.
    ///
    /// An explicit path must exist. Otherwise the default path is used when
    /// present, and built-in defaults when not. Environment keys are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    tracing::debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply API keys from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_with(|var| std::env::var(var).ok());
    }

    /// Apply API keys from `lookup`, which maps a variable name to its value.
    ///
    /// Blank values are ignored so an empty export does not erase a key
    /// from the file.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (provider, var) in API_KEY_VARS {
            let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            if let Some(settings) = self.providers.get_mut(provider) {
                tracing::debug!(provider, var, "API key taken from environment");
                settings.api_key = Some(value);
            }
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Config`] for invalid settings, or
    /// [`ScopeError::Intel`] when the analysis section is rejected.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        if self.providers.timeout_seconds == 0 {
            return Err(ScopeError::Config(
                "providers.timeout_seconds must be greater than 0".into(),
            ));
        }
        for (name, settings) in self.providers.iter() {
            if settings.timeout_seconds == Some(0) {
                return Err(ScopeError::Config(format!(
                    "providers.{name}.timeout_seconds must be greater than 0"
                )));
            }
            if settings.base_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
                return Err(ScopeError::Config(format!(
                    "providers.{name}.base_url must not be empty"
                )));
            }
        }
        if self.cache.enabled && (self.cache.ttl_seconds == 0 || self.cache.max_entries == 0) {
            return Err(ScopeError::Config(
                "cache.ttl_seconds and cache.max_entries must be greater than 0".into(),
            ));
        }
        if self.batch.max_indicators == 0 {
            return Err(ScopeError::Config(
                "batch.max_indicators must be greater than 0".into(),
            ));
        }
        if self.batch.concurrency == 0 {
            return Err(ScopeError::Config(
                "batch.concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
