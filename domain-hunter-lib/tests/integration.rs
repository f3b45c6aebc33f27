// domain-hunter-lib/tests/integration.rs

//! Integration tests for the resolution cascade against local mock servers.
//!
//! RDAP and WHOIS go through real HTTP against wiremock; DNS is replaced by a
//! scripted probe so nothing here touches the network.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use domain_hunter_lib::{
    Availability, DomainChecker, DomainHunter, DomainHunterError, PresenceProbe, RdapClient,
    RegistrationSource, ResolutionMethod, ResolveConfig, ResultCache, WhoisClient, WhoisProvider,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct ScriptedDns(bool);

#[async_trait]
impl PresenceProbe for ScriptedDns {
    async fn has_dns(&self, _domain: &str) -> Result<bool, DomainHunterError> {
        Ok(self.0)
    }
}

/// Configuration pointing every upstream at the mock server.
fn mock_config(server: &MockServer) -> ResolveConfig {
    ResolveConfig::default()
        .with_http_timeout(Duration::from_secs(2))
        .with_pacing_interval(Duration::ZERO)
        .with_generic_rdap_url(format!("{}/generic/", server.uri()))
        .with_rdap_endpoint("com", format!("{}/com/domain/", server.uri()))
        .with_whois_providers(vec![
            WhoisProvider::new("first", format!("{}/p1/{{domain}}?key={{api_key}}", server.uri()))
                .with_api_key("k1"),
            WhoisProvider::new("second", format!("{}/p2/{{domain}}", server.uri())),
        ])
}

fn rdap_body(expiration: &str, registrar: &str) -> serde_json::Value {
    serde_json::json!({
        "objectClassName": "domain",
        "ldhName": "EXAMPLE.COM",
        "events": [
            { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" },
            { "eventAction": "expiration", "eventDate": expiration }
        ],
        "entities": [{
            "objectClassName": "entity",
            "roles": ["registrar"],
            "vcardArray": ["vcard", [
                ["version", {}, "text", "4.0"],
                ["fn", {}, "text", registrar]
            ]]
        }]
    })
}

fn checker_with_dns(config: &ResolveConfig, has_dns: bool) -> DomainChecker {
    let rdap: Arc<dyn RegistrationSource> = Arc::new(RdapClient::with_config(config).unwrap());
    let whois: Arc<dyn RegistrationSource> = Arc::new(WhoisClient::with_config(config).unwrap());
    DomainChecker::from_parts(rdap, Some(whois), Arc::new(ScriptedDns(has_dns)))
}

#[tokio::test]
async fn test_rdap_registry_endpoint_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/domain/example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rdap_body("2031-08-13T04:00:00Z", "Example Registrar Inc.")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generic/example.com"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = RdapClient::with_config(&mock_config(&server)).unwrap();
    let data = client.lookup("example.com").await.unwrap().unwrap();

    assert_eq!(data.registrar, "Example Registrar Inc.");
    assert_eq!(data.method, ResolutionMethod::Rdap);
    assert_eq!(data.expiration_date.to_rfc3339(), "2031-08-13T04:00:00+00:00");
}

#[tokio::test]
async fn test_rdap_falls_back_to_generic_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/domain/fallback.com"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generic/fallback.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rdap_body(
            "2030-01-01T00:00:00Z",
            "Proxy Registrar",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = RdapClient::with_config(&mock_config(&server)).unwrap();
    let data = client.check_domain("fallback.com").await.unwrap();
    assert_eq!(data.registrar, "Proxy Registrar");
}

#[tokio::test]
async fn test_rdap_unlisted_and_dotless_names_use_generic_proxy() {
    let server = MockServer::start().await;
    for name in ["example.zzz", "localhost"] {
        Mock::given(method("GET"))
            .and(path(format!("/generic/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(rdap_body(
                "2030-01-01T00:00:00Z",
                "Generic",
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = RdapClient::with_config(&mock_config(&server)).unwrap();
    assert!(client.check_domain("example.zzz").await.is_some());
    assert!(client.check_domain("localhost").await.is_some());
}

#[tokio::test]
async fn test_rdap_failures_are_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/com/domain/broken.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generic/broken.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "events": [{ "eventAction": "registration", "eventDate": "2001-01-01T00:00:00Z" }]
        })))
        .mount(&server)
        .await;

    let client = RdapClient::with_config(&mock_config(&server)).unwrap();
    assert_eq!(client.lookup("broken.com").await.unwrap(), None);
    // Nothing mounted for this one: wiremock answers 404 everywhere.
    assert_eq!(client.lookup("unknown.com").await.unwrap(), None);
}

#[tokio::test]
async fn test_rdap_timeout_is_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rdap_body("2030-01-01T00:00:00Z", "Slow"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = mock_config(&server).with_http_timeout(Duration::from_millis(200));
    let client = RdapClient::with_config(&config).unwrap();
    assert!(client.check_domain("slow.com").await.is_none());
}

#[tokio::test]
async fn test_whois_first_provider_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p1/example.co"))
        .and(query_param("key", "k1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "WhoisRecord": {
                "registryData": { "expiresDate": "2029-12-31T00:00:00Z" },
                "registrarName": "First Proxy Registrar"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p2/example.co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "expiry_date": "2040-01-01", "registrar": "Second"
        })))
        .expect(0)
        .mount(&server)
        .await;

    let client = WhoisClient::with_config(&mock_config(&server)).unwrap();
    let data = client.lookup("example.co").await.unwrap().unwrap();
    assert_eq!(data.registrar, "First Proxy Registrar");
    assert_eq!(data.method, ResolutionMethod::Whois);
}

#[tokio::test]
async fn test_whois_failing_provider_advances() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p1/example.co"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p2/example.co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "domain": "example.co",
            "expire_date": "2027-04-05T06:07:08Z",
            "registrar": { "name": "Flat Registrar" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WhoisClient::with_config(&mock_config(&server)).unwrap();
    let data = client.check_domain("example.co").await.unwrap();
    assert_eq!(data.registrar, "Flat Registrar");
}

#[tokio::test]
async fn test_whois_all_providers_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p1/example.co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ErrorMessage": { "errorCode": "API_KEY_01", "msg": "invalid key" }
        })))
        .mount(&server)
        .await;

    let client = WhoisClient::with_config(&mock_config(&server)).unwrap();
    assert_eq!(client.lookup("example.co").await.unwrap(), None);
}

#[tokio::test]
async fn test_cascade_registered_via_rdap() {
    let server = MockServer::start().await;
    let expiration = (Utc::now() + ChronoDuration::days(45)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/com/domain/taken.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(rdap_body(&expiration, "Registrar Two")),
        )
        .mount(&server)
        .await;

    let record = checker_with_dns(&mock_config(&server), true)
        .resolve("taken.com")
        .await;

    assert_eq!(record.available, Availability::Taken);
    assert_eq!(record.method, ResolutionMethod::Rdap);
    assert!(record.has_dns);
    assert!(matches!(record.days_left, Some(44..=45)));
    assert_eq!(record.registrar.as_deref(), Some("Registrar Two"));
}

#[tokio::test]
async fn test_cascade_whois_when_rdap_has_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p2/legacy.co"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "expiry_date": "2035-06-01", "registrar": "Legacy Registrar"
        })))
        .mount(&server)
        .await;

    let record = checker_with_dns(&mock_config(&server), false)
        .resolve("legacy.co")
        .await;

    assert_eq!(record.method, ResolutionMethod::Whois);
    assert_eq!(record.available, Availability::Taken);
    assert!(!record.has_dns);
    assert_eq!(record.registrar.as_deref(), Some("Legacy Registrar"));
}

#[tokio::test]
async fn test_unregistered_domain_end_to_end_and_cached() {
    let server = MockServer::start().await;
    // Every upstream call: registry, generic proxy, both WHOIS providers.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let hunter = DomainHunter::new(
        checker_with_dns(&config, false),
        ResultCache::in_memory(config.cache_ttl),
        config.pacing_interval,
    );

    let first = hunter.lookup("Fresh-Idea-4711.com").await.unwrap();
    assert_eq!(first.domain, "fresh-idea-4711.com");
    assert_eq!(first.available, Availability::Available);
    assert_eq!(first.method, ResolutionMethod::Dns);
    assert!(!first.has_dns);
    assert!(first.expiration_date.is_none());
    assert!(first.registrar.is_none());

    let second = hunter.lookup("fresh-idea-4711.com").await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_parked_domain_with_dns_only() {
    let server = MockServer::start().await;

    let record = checker_with_dns(&mock_config(&server), true)
        .resolve("parked.com")
        .await;

    assert_eq!(record.available, Availability::Taken);
    assert_eq!(record.method, ResolutionMethod::Dns);
    assert_eq!(record.registrar.as_deref(), Some("Unknown"));
    assert!(record.days_left.is_none());
}

#[tokio::test]
async fn test_file_backed_hunter_survives_restart() {
    let server = MockServer::start().await;
    let expiration = (Utc::now() + ChronoDuration::days(20)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/com/domain/persist.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rdap_body(&expiration, "Durable")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = mock_config(&server).with_cache_file(dir.path().join("domains.json"));

    {
        let cache = ResultCache::open_file(dir.path().join("domains.json"), config.cache_ttl)
            .await
            .unwrap();
        let hunter = DomainHunter::new(checker_with_dns(&config, true), cache, Duration::ZERO);
        hunter.lookup("persist.com").await.unwrap();
    }

    let reopened = DomainHunter::from_config(&config).await.unwrap();
    let record = reopened.lookup("persist.com").await.unwrap();
    assert_eq!(record.registrar.as_deref(), Some("Durable"));

    let expiring = reopened.expiring_soon(30).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(reopened.stats().await.unwrap().expiring_30, 1);
}
