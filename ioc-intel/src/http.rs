//! Shared HTTP plumbing for provider requests.
//!
//! Provides a configured [`reqwest::Client`], endpoint construction with
//! proper path-segment encoding, and the mapping from HTTP responses onto
//! the [`ProviderError`] taxonomy.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::ProviderError;

/// User agent sent with every provider request.
pub const USER_AGENT: &str = concat!("ioc-intel/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for provider lookups.
///
/// The client has:
/// - the given request timeout
/// - the crate user agent
/// - gzip decompression
/// - at most 5 redirects
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the client cannot be constructed.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ProviderError::Http(format!("failed to build HTTP client: {e}")))
}

/// Append path segments to `base`, percent-encoding each one.
///
/// Segments may contain `/` (URL indicators do); it is encoded rather than
/// treated as a separator.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ProviderError> {
    let mut url =
        Url::parse(base).map_err(|e| ProviderError::Http(format!("invalid base url: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| ProviderError::Http("base url cannot carry a path".into()))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Send a request and decode a JSON body.
///
/// Returns `Ok(None)` for HTTP 404, which every provider treats as "not in
/// dataset". Transport errors are stripped of their URL so credentials
/// passed as query parameters never reach logs.
pub(crate) async fn fetch_json(
    request: reqwest::RequestBuilder,
) -> Result<Option<serde_json::Value>, ProviderError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    check_status(status)?;

    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| ProviderError::Parse(format!("invalid JSON body: {e}")))
}

/// Map a non-success status onto a provider error.
pub(crate) fn check_status(status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited(format!("HTTP {}", status.as_u16())));
    }
    if !status.is_success() {
        return Err(ProviderError::Http(format!("unexpected status {status}")));
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else {
        ProviderError::Http(err.to_string())
    }
}
