//! Indicator classification and normalization.
//!
//! A raw string is tested against each supported shape in a fixed order and
//! the first match wins. Several inputs satisfy more than one shape (a
//! 32-character hex string is also a valid domain label, `a@b.co` contains a
//! domain), so the order below is part of the contract:
//!
//! 1. empty → [`ClassificationError::Empty`]
//! 2. exact-length hex → MD5 / SHA-1 / SHA-256
//! 3. email address
//! 4. IPv4 / IPv6 literal
//! 5. `http(s)://` URL
//! 6. domain (after stripping protocol, path and port)
//! 7. anything else → [`ClassificationError::Unrecognized`]
//!
//! Classification is pure and performs no I/O.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClassificationError;
use crate::types::{Indicator, IndicatorKind};

static HASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Fa-f0-9]{32}|[A-Fa-f0-9]{40}|[A-Fa-f0-9]{64})$")
        .expect("valid hash regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:https?)://[^\s/$.?#]\S+$")
        .expect("valid url regex")
});

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .expect("valid domain label regex")
});

/// Classify a raw indicator string and compute its normalized form.
///
/// # Errors
///
/// - [`ClassificationError::Empty`] if `raw` is blank.
/// - [`ClassificationError::Ambiguous`] if `raw` only fits the domain shape
///   with purely numeric labels (e.g. `999.1.1.1`), which is neither a valid
///   IP literal nor a plausible host name.
/// - [`ClassificationError::Unrecognized`] if no shape matches.
///
/// # Examples
///
/// ```
/// use ioc_intel::classifier::classify;
/// use ioc_intel::IndicatorKind;
///
/// let indicator = classify("  Evil.Example.COM/login ").unwrap();
/// assert_eq!(indicator.kind(), IndicatorKind::Domain);
/// assert_eq!(indicator.normalized(), "evil.example.com");
/// ```
pub fn classify(raw: &str) -> Result<Indicator, ClassificationError> {
    let kind = detect_kind(raw)?;
    Ok(Indicator::new(raw, kind, normalize(raw, kind)))
}

/// Determine the indicator kind without normalizing.
pub fn detect_kind(raw: &str) -> Result<IndicatorKind, ClassificationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ClassificationError::Empty);
    }

    if let Some(kind) = hash_kind(value) {
        return Ok(kind);
    }
    if EMAIL_RE.is_match(value) {
        return Ok(IndicatorKind::Email);
    }
    if value.parse::<IpAddr>().is_ok() {
        return Ok(IndicatorKind::IpAddress);
    }
    if is_url(value) {
        return Ok(IndicatorKind::Url);
    }

    let host = host_part(value);
    if is_domain(host) {
        if host.split('.').all(|label| label.bytes().all(|b| b.is_ascii_digit())) {
            return Err(ClassificationError::Ambiguous);
        }
        return Ok(IndicatorKind::Domain);
    }

    Err(ClassificationError::Unrecognized)
}

/// Normalize `raw` for the given kind.
///
/// Deterministic and idempotent: `normalize(&normalize(x, k), k) == normalize(x, k)`.
///
/// - hashes, emails: trimmed and lower-cased
/// - IP literals: trimmed
/// - domains: protocol, path and port stripped, lower-cased, root dot dropped
/// - URLs: `https://` prepended when no protocol is present, otherwise kept
pub fn normalize(raw: &str, kind: IndicatorKind) -> String {
    let value = raw.trim();
    match kind {
        IndicatorKind::HashMd5
        | IndicatorKind::HashSha1
        | IndicatorKind::HashSha256
        | IndicatorKind::Email => value.to_lowercase(),
        IndicatorKind::IpAddress | IndicatorKind::Unknown => value.to_owned(),
        IndicatorKind::Domain => host_part(value).to_lowercase(),
        IndicatorKind::Url => {
            if has_http_scheme(value) {
                value.to_owned()
            } else {
                format!("https://{value}")
            }
        }
    }
}

fn hash_kind(value: &str) -> Option<IndicatorKind> {
    if !HASH_RE.is_match(value) {
        return None;
    }
    match value.len() {
        32 => Some(IndicatorKind::HashMd5),
        40 => Some(IndicatorKind::HashSha1),
        64 => Some(IndicatorKind::HashSha256),
        _ => None,
    }
}

fn is_url(value: &str) -> bool {
    URL_RE.is_match(value)
}

fn is_domain(host: &str) -> bool {
    host.contains('.') && host.split('.').all(|label| LABEL_RE.is_match(label))
}

fn has_http_scheme(value: &str) -> bool {
    scheme_len(value).is_some()
}

/// Length of a leading `http://` or `https://`, matched case-insensitively.
fn scheme_len(value: &str) -> Option<usize> {
    ["https://", "http://"].into_iter().find_map(|scheme| {
        value
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| scheme.len())
    })
}

/// Strip protocol, path, port and a trailing root dot, leaving the host.
fn host_part(value: &str) -> &str {
    let rest = match scheme_len(value) {
        Some(len) => &value[len..],
        None => value,
    };
    let rest = rest.split('/').next().unwrap_or(rest);
    let rest = rest.split(':').next().unwrap_or(rest);
    rest.strip_suffix('.').unwrap_or(rest)
}
