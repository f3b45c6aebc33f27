//! JSON WHOIS proxy fallback.
//!
//! Consulted only when RDAP yields nothing. Providers are tried in order and
//! the first one that produces an expiration date wins. Any failure on a
//! provider silently advances to the next one.

use crate::error::DomainHunterError;
use crate::protocols::rdap::build_http_client;
use crate::protocols::RegistrationSource;
use crate::types::{
    RegistrationData, ResolutionMethod, ResolveConfig, WhoisProvider, UNKNOWN_REGISTRAR,
};
use crate::utils::parse_timestamp_value;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Expiration field names used by flat (schema B) providers.
const FLAT_EXPIRY_FIELDS: [&str; 4] = [
    "expiry_date",
    "expiration_date",
    "expire_date",
    "expires",
];

/// WHOIS fallback client over an ordered list of JSON proxies.
#[derive(Clone)]
pub struct WhoisClient {
    http_client: reqwest::Client,
    providers: Vec<WhoisProvider>,
    timeout: Duration,
}

impl WhoisClient {
    /// Create a client over the default provider list.
    pub fn new() -> Result<Self, DomainHunterError> {
        Self::with_config(&ResolveConfig::default())
    }

    /// Create a client from the runtime configuration.
    pub fn with_config(config: &ResolveConfig) -> Result<Self, DomainHunterError> {
        Ok(Self {
            http_client: build_http_client(config.http_timeout, &config.user_agent)?,
            providers: config.whois_providers.clone(),
            timeout: config.http_timeout,
        })
    }

    pub fn providers(&self) -> &[WhoisProvider] {
        &self.providers
    }

    /// Try each provider in order until one yields an expiration date.
    pub async fn check_domain(&self, domain: &str) -> Option<RegistrationData> {
        for provider in &self.providers {
            match self.query_provider(provider, domain).await {
                Ok(Some(data)) => {
                    debug!(domain, provider = %provider.name, "WHOIS proxy hit");
                    return Some(data);
                }
                Ok(None) => {
                    debug!(domain, provider = %provider.name, "WHOIS proxy returned no expiration date");
                }
                Err(e) => {
                    debug!(domain, provider = %provider.name, error = %e, "WHOIS proxy failed");
                }
            }
        }
        None
    }

    async fn query_provider(
        &self,
        provider: &WhoisProvider,
        domain: &str,
    ) -> Result<Option<RegistrationData>, DomainHunterError> {
        let url = provider.request_url(domain);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DomainHunterError::timeout(format!("WHOIS query to {}", provider.name), self.timeout)
            } else {
                DomainHunterError::whois(&provider.name, domain, format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DomainHunterError::whois(
                &provider.name,
                domain,
                format!("HTTP {}", status),
            ));
        }

        let json = response.json::<Value>().await.map_err(|e| {
            DomainHunterError::whois(&provider.name, domain, format!("Invalid JSON: {}", e))
        })?;

        Ok(parse_whois_response(&json))
    }
}

#[async_trait]
impl RegistrationSource for WhoisClient {
    async fn lookup(&self, domain: &str) -> Result<Option<RegistrationData>, DomainHunterError> {
        Ok(self.check_domain(domain).await)
    }

    fn method(&self) -> ResolutionMethod {
        ResolutionMethod::Whois
    }
}

/// Parse a WHOIS proxy response in any of the supported shapes.
///
/// The nested `WhoisRecord` shape is tried first, the flat shape second.
pub fn parse_whois_response(json: &Value) -> Option<RegistrationData> {
    parse_whois_record(json).or_else(|| parse_flat_whois(json))
}

/// `{"WhoisRecord": {"expiresDate", "registrarName", "registryData": {...}}}`
fn parse_whois_record(json: &Value) -> Option<RegistrationData> {
    let record = json.get("WhoisRecord")?;
    let registry_data = record.get("registryData");

    let expiration_date = expiry_from(record, "expiresDate")
        .or_else(|| registry_data.and_then(|data| expiry_from(data, "expiresDate")))?;

    let registrar = non_empty_str(record.get("registrarName"))
        .or_else(|| registry_data.and_then(|data| non_empty_str(data.get("registrarName"))));

    Some(whois_data(expiration_date, registrar))
}

/// `{"expiry_date": "...", "registrar": "..." | {"name": "..."}}`
fn parse_flat_whois(json: &Value) -> Option<RegistrationData> {
    let expiration_date = FLAT_EXPIRY_FIELDS
        .iter()
        .find_map(|field| expiry_from(json, field))?;

    let registrar = json.get("registrar").and_then(|registrar| match registrar {
        Value::Object(_) => non_empty_str(registrar.get("name")),
        other => non_empty_str(Some(other)),
    });

    Some(whois_data(expiration_date, registrar))
}

fn expiry_from(value: &Value, field: &str) -> Option<DateTime<Utc>> {
    value.get(field).and_then(parse_timestamp_value)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn whois_data(expiration_date: DateTime<Utc>, registrar: Option<String>) -> RegistrationData {
    RegistrationData {
        expiration_date,
        registrar: registrar.unwrap_or_else(|| UNKNOWN_REGISTRAR.to_string()),
        method: ResolutionMethod::Whois,
    }
}
