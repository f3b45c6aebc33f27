//! RDAP (Registration Data Access Protocol) resolver.
//!
//! Queries the registry endpoint from the [`RegistryDirectory`] first and the
//! generic RDAP proxy second. Failures of either are logged and reported as
//! "no result" so the cascade can move on to WHOIS.

use crate::error::DomainHunterError;
use crate::protocols::registry::RegistryDirectory;
use crate::protocols::RegistrationSource;
use crate::types::{RegistrationData, ResolutionMethod, ResolveConfig, UNKNOWN_REGISTRAR};
use crate::utils::parse_timestamp_value;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client shared by the RDAP and WHOIS resolvers.
///
/// Sends browser-like headers; several registries answer unidentified
/// clients with 403.
pub(crate) fn build_http_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, DomainHunterError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/rdap+json, application/json;q=0.9, */*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .default_headers(headers)
        .build()
        .map_err(|e| {
            DomainHunterError::network_with_source("Failed to create HTTP client", e.to_string())
        })
}

/// RDAP resolver over the registry directory and the generic proxy.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// TLD -> registry endpoint table
    directory: RegistryDirectory,
    /// Generic RDAP proxy base URL, ending in `/`
    generic_url: String,
    /// Timeout for each RDAP request
    timeout: Duration,
}

impl RdapClient {
    /// Create an RDAP client with default settings.
    pub fn new() -> Result<Self, DomainHunterError> {
        Self::with_config(&ResolveConfig::default())
    }

    /// Create an RDAP client from the runtime configuration.
    pub fn with_config(config: &ResolveConfig) -> Result<Self, DomainHunterError> {
        Ok(Self {
            http_client: build_http_client(config.http_timeout, &config.user_agent)?,
            directory: RegistryDirectory::with_overrides(&config.rdap_overrides),
            generic_url: config.generic_rdap_url.clone(),
            timeout: config.http_timeout,
        })
    }

    /// The directory this client consults.
    pub fn directory(&self) -> &RegistryDirectory {
        &self.directory
    }

    /// Look a domain up: registry endpoint first, generic proxy second.
    ///
    /// Returns `None` unless one of them answered 200 with a parseable
    /// expiration date.
    pub async fn check_domain(&self, domain: &str) -> Option<RegistrationData> {
        if let Some(registry_url) = self.directory.domain_url(domain) {
            if let Some(data) = self.query(&registry_url, domain).await {
                return Some(data);
            }
        }

        let generic_url = format!("{}{}", self.generic_url, domain);
        self.query(&generic_url, domain).await
    }

    async fn query(&self, rdap_url: &str, domain: &str) -> Option<RegistrationData> {
        debug!(domain, url = rdap_url, "RDAP request");

        match self.fetch_json(rdap_url, domain).await {
            Ok(json) => {
                let parsed = parse_rdap_response(&json);
                if parsed.is_none() {
                    debug!(domain, url = rdap_url, "RDAP response has no usable expiration date");
                }
                parsed
            }
            Err(e) => {
                debug!(domain, url = rdap_url, error = %e, "RDAP request failed");
                None
            }
        }
    }

    async fn fetch_json(
        &self,
        rdap_url: &str,
        domain: &str,
    ) -> Result<serde_json::Value, DomainHunterError> {
        let response = self.http_client.get(rdap_url).send().await.map_err(|e| {
            if e.is_timeout() {
                DomainHunterError::timeout("RDAP request", self.timeout)
            } else {
                DomainHunterError::rdap(domain, format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DomainHunterError::RdapError {
                domain: domain.to_string(),
                message: format!("RDAP server returned {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| DomainHunterError::rdap(domain, format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl RegistrationSource for RdapClient {
    async fn lookup(&self, domain: &str) -> Result<Option<RegistrationData>, DomainHunterError> {
        Ok(self.check_domain(domain).await)
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::Rdap
    }
}

/// Turn an RDAP domain document into registration data.
///
/// Returns `None` when no expiration date can be found. The registrar falls
/// back to `"Unknown"` whenever the entity/vCard structure is incomplete.
pub fn parse_rdap_response(json: &serde_json::Value) -> Option<RegistrationData> {
    let expiration_date = extract_expiration_date(json)?;

    Some(RegistrationData {
        expiration_date,
        registrar: extract_registrar(json).unwrap_or_else(|| UNKNOWN_REGISTRAR.to_string()),
        method: ResolutionMethod::Rdap,
    })
}

/// Registries disagree on the event name, so both `expiration` and `expiry`
/// count. A top-level `expirationDate` is the last resort.
fn extract_expiration_date(json: &serde_json::Value) -> Option<DateTime<Utc>> {
    if let Some(events) = json.get("events").and_then(|e| e.as_array()) {
        for event in events {
            let action = event.get("eventAction").and_then(|a| a.as_str());
            let is_expiry = matches!(
                action.map(str::to_ascii_lowercase).as_deref(),
                Some("expiration") | Some("expiry")
            );
            if !is_expiry {
                continue;
            }
            if let Some(date) = event.get("eventDate").and_then(parse_timestamp_value) {
                return Some(date);
            }
        }
    }

    json.get("expirationDate").and_then(parse_timestamp_value)
}

/// Name of the first registrar entity that carries a vCard `fn`.
fn extract_registrar(json: &serde_json::Value) -> Option<String> {
    json.get("entities")?
        .as_array()?
        .iter()
        .filter(|entity| {
            entity
                .get("roles")
                .and_then(|r| r.as_array())
                .is_some_and(|roles| roles.iter().any(|role| role.as_str() == Some("registrar")))
        })
        .find_map(extract_vcard_name)
}

/// Extract the formatted name from a jCard: `["vcard", [["fn", {}, "text", "Name"], ...]]`.
fn extract_vcard_name(entity: &serde_json::Value) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(|v| v.as_array())
        .and_then(|a| a.get(1))
        .and_then(|a| a.as_array())
        .and_then(|items| {
            items.iter().find_map(|item| {
                let fields = item.as_array()?;
                if fields.len() < 4 || fields.first()?.as_str()? != "fn" {
                    return None;
                }
                let name = fields.get(3)?.as_str()?.trim();
                (!name.is_empty()).then(|| name.to_string())
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn registrar_entity(name: &str) -> serde_json::Value {
        serde_json::json!({
            "roles": ["registrar"],
            "vcardArray": [
                "vcard",
                [
                    ["version", {}, "text", "4.0"],
                    ["fn", {}, "text", name]
                ]
            ]
        })
    }

    #[tokio::test]
    async fn test_rdap_client_creation() {
        let client = RdapClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_parse_expiration_event() {
        let json = serde_json::json!({
            "events": [
                { "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" },
                { "eventAction": "expiration", "eventDate": "2025-08-13T04:00:00Z" }
            ],
            "entities": [registrar_entity("Example Registrar Inc.")]
        });

        let data = parse_rdap_response(&json).unwrap();
        assert_eq!(
            data.expiration_date,
            Utc.with_ymd_and_hms(2025, 8, 13, 4, 0, 0).unwrap()
        );
        assert_eq!(data.registrar, "Example Registrar Inc.");
        assert_eq!(data.method, ResolutionMethod::Rdap);
    }

    #[test]
    fn test_parse_expiry_event_name() {
        let json = serde_json::json!({
            "events": [{ "eventAction": "Expiry", "eventDate": "2030-01-01T00:00:00Z" }]
        });
        let data = parse_rdap_response(&json).unwrap();
        assert_eq!(
            data.expiration_date,
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_top_level_expiration_date() {
        let json = serde_json::json!({
            "events": [{ "eventAction": "last changed", "eventDate": "2024-01-01T00:00:00Z" }],
            "expirationDate": "2027-03-04T05:06:07Z"
        });
        let data = parse_rdap_response(&json).unwrap();
        assert_eq!(
            data.expiration_date,
            Utc.with_ymd_and_hms(2027, 3, 4, 5, 6, 7).unwrap()
        );
    }

    #[test]
    fn test_parse_without_expiration_is_no_result() {
        let json = serde_json::json!({
            "events": [{ "eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z" }],
            "entities": [registrar_entity("Example Registrar Inc.")]
        });
        assert!(parse_rdap_response(&json).is_none());

        let unparseable = serde_json::json!({
            "events": [{ "eventAction": "expiration", "eventDate": "soon" }]
        });
        assert!(parse_rdap_response(&unparseable).is_none());

        assert!(parse_rdap_response(&serde_json::json!([])).is_none());
    }

    #[test]
    fn test_missing_entities_yields_unknown_registrar() {
        let json = serde_json::json!({
            "events": [{ "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }]
        });
        let data = parse_rdap_response(&json).unwrap();
        assert_eq!(data.registrar, "Unknown");
    }

    #[test]
    fn test_incomplete_vcards_yield_unknown_registrar() {
        let cases = [
            // registrar without vcardArray
            serde_json::json!([{ "roles": ["registrar"], "handle": "292" }]),
            // vcardArray without fn
            serde_json::json!([{
                "roles": ["registrar"],
                "vcardArray": ["vcard", [["version", {}, "text", "4.0"]]]
            }]),
            // malformed vcardArray
            serde_json::json!([{ "roles": ["registrar"], "vcardArray": "vcard" }]),
            // fn present but not on the registrar
            serde_json::json!([{
                "roles": ["registrant"],
                "vcardArray": ["vcard", [["fn", {}, "text", "Jane Doe"]]]
            }]),
            // entities is not an array
            serde_json::json!({ "roles": ["registrar"] }),
        ];

        for entities in cases {
            let json = serde_json::json!({
                "events": [{ "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }],
                "entities": entities
            });
            let data = parse_rdap_response(&json).unwrap();
            assert_eq!(data.registrar, "Unknown", "entities: {}", json["entities"]);
        }
    }

    #[test]
    fn test_second_registrar_entity_used_when_first_has_no_name() {
        let json = serde_json::json!({
            "events": [{ "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }],
            "entities": [
                { "roles": ["registrar"] },
                registrar_entity("Second Registrar LLC")
            ]
        });
        assert_eq!(parse_rdap_response(&json).unwrap().registrar, "Second Registrar LLC");
    }

    #[test]
    fn test_extract_vcard_name() {
        let entity = serde_json::json!({
            "vcardArray": [
                "vcard",
                [
                    ["fn", {}, "text", "Example Registrar Inc."]
                ]
            ]
        });

        let name = extract_vcard_name(&entity);
        assert_eq!(name, Some("Example Registrar Inc.".to_string()));
    }
}
