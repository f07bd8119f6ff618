//! Provider Contract Tests
//!
//! These tests verify the HTTP contract of each built-in provider against a
//! mock server:
//! - request path, query parameters and auth headers
//! - response normalization into metrics
//! - not-found handling
//! - error status and malformed body mapping to ProviderError

use std::sync::Arc;
use std::time::Duration;

use ioc_intel::providers::{
    AbuseIpDbConfig, AbuseIpDbProvider, OtxConfig, OtxProvider, UrlscanConfig, UrlscanProvider,
    VirusTotalConfig, VirusTotalProvider,
};
use ioc_intel::{
    classify, AnalysisConfig, Analyzer, LookupResponse, OutcomeState, ProviderError,
    ThreatProvider, Verdict,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MD5: &str = "44d88612fea8a8f36de82e1278abb02f";

fn found_metrics(response: LookupResponse) -> ioc_intel::Metrics {
    match response {
        LookupResponse::Found { metrics, .. } => metrics,
        other => panic!("expected Found, got {other:?}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// VirusTotal
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn virustotal_file_report_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vtapi/v2/file/report"))
        .and(query_param("apikey", "test-key"))
        .and(query_param("resource", MD5))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response_code": 1,
            "positives": 15,
            "total": 70,
            "scan_date": "2024-05-01 10:00:00"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        VirusTotalProvider::new(VirusTotalConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify(MD5).expect("md5");

    let metrics = found_metrics(provider.lookup(&indicator).await.expect("lookup"));
    assert_eq!(metrics.number("malicious_count"), Some(15.0));
    assert_eq!(metrics.number("total_count"), Some(70.0));
}

#[tokio::test]
async fn virustotal_unknown_resource_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vtapi/v2/ip-address/report"))
        .and(query_param("ip", "203.0.113.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response_code": 0,
            "verbose_msg": "Missing IP address"
        })))
        .mount(&mock_server)
        .await;

    let provider =
        VirusTotalProvider::new(VirusTotalConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("203.0.113.9").expect("ip");

    let response = provider.lookup(&indicator).await.expect("lookup");
    assert!(matches!(response, LookupResponse::NotFound { .. }));
}

#[tokio::test]
async fn virustotal_rate_limit_maps_to_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vtapi/v2/domain/report"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let provider =
        VirusTotalProvider::new(VirusTotalConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("evil.example.com").expect("domain");

    let err = provider.lookup(&indicator).await.unwrap_err();
    assert!(matches!(err, ProviderError::RateLimited(_)), "got {err:?}");
}

#[tokio::test]
async fn virustotal_server_error_does_not_leak_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vtapi/v2/url/report"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = VirusTotalProvider::new(
        VirusTotalConfig::new("super-secret").with_base_url(mock_server.uri()),
    );
    let indicator = classify("https://evil.example.com/payload").expect("url");

    let err = provider.lookup(&indicator).await.unwrap_err();
    assert!(matches!(err, ProviderError::Http(_)));
    assert!(!err.to_string().contains("super-secret"));
}

// ────────────────────────────────────────────────────────────────────────────
// AbuseIPDB
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn abuseipdb_ip_check_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/check"))
        .and(header("Key", "test-key"))
        .and(query_param("ipAddress", "185.220.101.1"))
        .and(query_param("maxAgeInDays", "90"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "ipAddress": "185.220.101.1",
                "abuseConfidenceScore": 100,
                "isTor": true,
                "isPublic": true
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        AbuseIpDbProvider::new(AbuseIpDbConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("185.220.101.1").expect("ip");

    let metrics = found_metrics(provider.lookup(&indicator).await.expect("lookup"));
    assert_eq!(metrics.number("abuse_confidence"), Some(100.0));
    assert_eq!(metrics.flag("is_tor"), Some(true));
}

#[tokio::test]
async fn abuseipdb_domain_uses_block_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/check-block"))
        .and(query_param("network", "evil.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"abuseConfidenceScore": 40}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        AbuseIpDbProvider::new(AbuseIpDbConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("Evil.Example.com").expect("domain");

    let metrics = found_metrics(provider.lookup(&indicator).await.expect("lookup"));
    assert_eq!(metrics.number("abuse_confidence"), Some(40.0));
}

#[tokio::test]
async fn abuseipdb_404_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/check"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let provider =
        AbuseIpDbProvider::new(AbuseIpDbConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("198.51.100.7").expect("ip");

    let response = provider.lookup(&indicator).await.expect("lookup");
    assert!(matches!(response, LookupResponse::NotFound { .. }));
}

#[tokio::test]
async fn abuseipdb_missing_data_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": []})))
        .mount(&mock_server)
        .await;

    let provider =
        AbuseIpDbProvider::new(AbuseIpDbConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("198.51.100.7").expect("ip");

    let err = provider.lookup(&indicator).await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// OTX
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn otx_ipv4_general_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/indicators/IPv4/185.220.101.1/general"))
        .and(header("X-OTX-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pulse_info": {"count": 120},
            "reputation": -75,
            "tags": ["tor", "Brute Force"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OtxProvider::new(OtxConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("185.220.101.1").expect("ip");

    let metrics = found_metrics(provider.lookup(&indicator).await.expect("lookup"));
    assert_eq!(metrics.number("pulse_count"), Some(120.0));
    assert_eq!(metrics.number("reputation"), Some(-75.0));
    assert_eq!(metrics.tags("tags").map(<[String]>::len), Some(2));
}

#[tokio::test]
async fn otx_404_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/indicators/domain/unknown.example.org/general"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let provider = OtxProvider::new(OtxConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("unknown.example.org").expect("domain");

    let response = provider.lookup(&indicator).await.expect("lookup");
    assert!(matches!(response, LookupResponse::NotFound { .. }));
}

#[tokio::test]
async fn otx_non_json_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/indicators/file/{MD5}/general")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = OtxProvider::new(OtxConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify(MD5).expect("md5");

    let err = provider.lookup(&indicator).await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// urlscan.io
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn urlscan_domain_search_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .and(query_param("q", "domain:\"evil.example.com\""))
        .and(query_param("size", "10"))
        .and(header("API-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"page": {"domain": "evil.example.com"}},
                {"page": {"domain": "evil.example.com"}},
                {"page": {"domain": "evil.example.com"}}
            ],
            "total": 3
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        UrlscanProvider::new(UrlscanConfig::new("test-key").with_base_url(mock_server.uri()));
    let indicator = classify("evil.example.com").expect("domain");

    let metrics = found_metrics(provider.lookup(&indicator).await.expect("lookup"));
    assert_eq!(metrics.number("scan_count"), Some(3.0));
}

#[tokio::test]
async fn urlscan_works_without_key_and_empty_results_are_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [], "total": 0})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        UrlscanProvider::new(UrlscanConfig::default().with_base_url(mock_server.uri()));
    assert!(provider.is_configured());
    let indicator = classify("https://quiet.example.net/").expect("url");

    let response = provider.lookup(&indicator).await.expect("lookup");
    assert!(matches!(response, LookupResponse::NotFound { .. }));
}

// ────────────────────────────────────────────────────────────────────────────
// End to end
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_providers_against_one_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vtapi/v2/domain/report"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response_code": 1, "positives": 15, "total": 70
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/check-block"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"abuseConfidenceScore": 85}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/indicators/domain/evil.example.com/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pulse_info": {"count": 45}, "reputation": -60
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let providers: Vec<Arc<dyn ThreatProvider>> = vec![
        Arc::new(VirusTotalProvider::new(
            VirusTotalConfig::new("k").with_base_url(&base),
        )),
        Arc::new(AbuseIpDbProvider::new(
            AbuseIpDbConfig::new("k").with_base_url(&base),
        )),
        Arc::new(OtxProvider::new(OtxConfig::new("k").with_base_url(&base))),
        Arc::new(UrlscanProvider::new(
            UrlscanConfig::new("k").with_base_url(&base),
        )),
    ];
    let analyzer = Analyzer::new(AnalysisConfig::default(), providers).expect("analyzer");
    let indicator = classify("evil.example.com").expect("domain");

    let outcomes = analyzer.query(&indicator).await;
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes["urlscan"].state, OutcomeState::Failed);

    let result = analyzer.aggregate(&outcomes);
    assert_eq!(result.verdict, Verdict::Malicious);
    assert!((result.confidence_score - 0.875).abs() < 1e-9);
    assert!(!result.per_provider_scores.contains_key("urlscan"));
}

#[tokio::test]
async fn slow_provider_times_out_as_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/search/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let provider = UrlscanProvider::new(
        UrlscanConfig::default()
            .with_base_url(mock_server.uri())
            .with_timeout(Duration::from_millis(200)),
    );
    let analyzer =
        Analyzer::new(AnalysisConfig::default(), vec![Arc::new(provider)]).expect("analyzer");
    let indicator = classify("slow.example.com").expect("domain");

    let outcomes = analyzer.query(&indicator).await;
    assert_eq!(outcomes["urlscan"].state, OutcomeState::Failed);
}
