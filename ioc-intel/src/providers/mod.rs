//! Built-in HTTP providers.
//!
//! Each provider owns a `*Config` with its credentials, base URL and
//! timeout. Base URLs are overridable so tests can point them at a mock
//! server.

pub mod abuseipdb;
pub mod otx;
pub mod urlscan;
pub mod virustotal;

pub use abuseipdb::{AbuseIpDbConfig, AbuseIpDbProvider};
pub use otx::{OtxConfig, OtxProvider};
pub use urlscan::{UrlscanConfig, UrlscanProvider};
pub use virustotal::{VirusTotalConfig, VirusTotalProvider};

/// Names of the built-in providers.
pub const BUILTIN_PROVIDERS: [&str; 4] = [
    VirusTotalProvider::NAME,
    AbuseIpDbProvider::NAME,
    OtxProvider::NAME,
    UrlscanProvider::NAME,
];

/// A non-blank API key is present.
fn has_key(api_key: &Option<String>) -> bool {
    api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
}
