//! Core data types for domain resolution.
//!
//! This module defines the canonical [`DomainRecord`], the normalized
//! registration data each resolver hands back, and the runtime configuration
//! shared by the resolvers, the cache and the bulk controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::time::Duration;

/// Explicit registrar value used when a source confirms registration
/// but does not name the registrar.
pub const UNKNOWN_REGISTRAR: &str = "Unknown";

/// Whether a domain can be registered.
///
/// Serialized as `true`, `false` or `"unknown"`. A JSON `null` is read back
/// as [`Availability::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Nothing claims the domain
    Available,
    /// A registry, a WHOIS proxy or DNS says the domain is in use
    Taken,
    /// Every source failed
    Unknown,
}

impl Availability {
    /// Map "is the domain live" onto availability.
    pub fn from_taken(taken: bool) -> Self {
        if taken {
            Availability::Taken
        } else {
            Availability::Available
        }
    }

    /// The nullable-boolean view of this value.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Availability::Available => Some(true),
            Availability::Taken => Some(false),
            Availability::Unknown => None,
        }
    }
}

impl Serialize for Availability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_bool() {
            Some(value) => serializer.serialize_bool(value),
            None => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for Availability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Text(String),
            Missing(Option<()>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(Availability::Available),
            Repr::Flag(false) => Ok(Availability::Taken),
            Repr::Text(text) if text.eq_ignore_ascii_case("unknown") => Ok(Availability::Unknown),
            Repr::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid availability value '{}'",
                text
            ))),
            Repr::Missing(_) => Ok(Availability::Unknown),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Taken => write!(f, "taken"),
            Availability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Which layer of the cascade produced a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResolutionMethod {
    /// Registry RDAP server or the generic RDAP proxy
    #[serde(rename = "rdap")]
    Rdap,

    /// Third-party JSON WHOIS proxy
    #[serde(rename = "whois")]
    Whois,

    /// DNS presence only, no registry data
    #[serde(rename = "dns")]
    Dns,

    /// The cascade failed unexpectedly
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionMethod::Rdap => write!(f, "rdap"),
            ResolutionMethod::Whois => write!(f, "whois"),
            ResolutionMethod::Dns => write!(f, "dns"),
            ResolutionMethod::Error => write!(f, "error"),
        }
    }
}

/// Normalized registration data extracted from one upstream response.
///
/// Every provider-specific parser produces this shape, so nothing above the
/// parsers knows about `vcardArray` or `WhoisRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationData {
    pub expiration_date: DateTime<Utc>,
    pub registrar: String,
    pub method: ResolutionMethod,
}

/// The canonical unit produced by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Lowercase, trimmed domain name; the cache key
    pub domain: String,

    pub available: Availability,

    /// Whether the domain resolved in DNS
    #[serde(rename = "hasDNS")]
    pub has_dns: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Whole days until expiration, rounded up; negative once expired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,

    pub method: ResolutionMethod,

    pub last_checked: DateTime<Utc>,
}

impl DomainRecord {
    /// Record for a domain a registry source reported an expiration date for.
    pub fn registered(
        domain: impl Into<String>,
        has_dns: bool,
        data: RegistrationData,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            domain: domain.into(),
            available: Availability::Taken,
            has_dns,
            days_left: Some(crate::utils::days_left(data.expiration_date, now)),
            expiration_date: Some(data.expiration_date),
            registrar: Some(data.registrar),
            method: data.method,
            last_checked: now,
        }
    }

    /// Record classified from DNS presence alone.
    pub fn from_dns(domain: impl Into<String>, has_dns: bool, now: DateTime<Utc>) -> Self {
        Self {
            domain: domain.into(),
            available: Availability::from_taken(has_dns),
            has_dns,
            expiration_date: None,
            days_left: None,
            registrar: has_dns.then(|| UNKNOWN_REGISTRAR.to_string()),
            method: ResolutionMethod::Dns,
            last_checked: now,
        }
    }

    /// Record for a lookup that failed unexpectedly.
    pub fn error(domain: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            domain: domain.into(),
            available: Availability::Unknown,
            has_dns: false,
            expiration_date: None,
            days_left: None,
            registrar: None,
            method: ResolutionMethod::Error,
            last_checked: now,
        }
    }

    /// Whether the record is still trusted at `now` under the given TTL.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(self.last_checked) < ttl
    }
}

/// Ordered result of a bulk run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkResult {
    pub results: Vec<DomainRecord>,
    pub total: usize,
}

impl BulkResult {
    pub fn new(results: Vec<DomainRecord>) -> Self {
        let total = results.len();
        Self { results, total }
    }
}

/// Read-only summary over every cached record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total: usize,
    pub available: usize,
    pub taken: usize,
    pub unknown: usize,
    /// `daysLeft <= 0`
    pub expired: usize,
    /// `daysLeft` in `1..=30`
    pub expiring_30: usize,
    /// `daysLeft` in `31..=90`
    pub expiring_90: usize,
    /// Records older than the cache TTL
    pub stale: usize,
    /// Short or otherwise valuable names, see [`is_premium_domain`](crate::is_premium_domain)
    pub premium: usize,
}

/// One JSON WHOIS proxy endpoint.
///
/// `url` is a template: `{domain}` and `{api_key}` are substituted per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoisProvider {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl WhoisProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build the request URL for a domain.
    pub fn request_url(&self, domain: &str) -> String {
        self.url
            .replace("{domain}", domain)
            .replace("{api_key}", self.api_key.as_deref().unwrap_or(""))
    }
}

/// Browser-like User-Agent; some registries reject unidentified clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Generic public RDAP proxy used when the registry directory has no entry
/// or the registry endpoint gave nothing usable.
pub const GENERIC_RDAP_URL: &str = "https://rdap.org/domain/";

/// The WHOIS proxies tried when RDAP yields nothing.
///
/// Both ship with placeholder keys; real deployments are expected to
/// configure their own providers.
pub fn default_whois_providers() -> Vec<WhoisProvider> {
    vec![
        WhoisProvider::new(
            "whoisxmlapi",
            "https://www.whoisxmlapi.com/whoisserver/WhoisService?apiKey={api_key}&domainName={domain}&outputFormat=JSON",
        )
        .with_api_key("demo"),
        WhoisProvider::new(
            "ip2whois",
            "https://api.ip2whois.com/v2?key={api_key}&domain={domain}",
        )
        .with_api_key("demo"),
    ]
}

/// Runtime configuration for resolution, caching and pacing.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Timeout for every RDAP and WHOIS HTTP call
    /// Default: 10 seconds
    pub http_timeout: Duration,

    /// Timeout for the DNS presence probe
    /// Default: 5 seconds
    pub dns_timeout: Duration,

    /// Delay between orchestrator invocations in a bulk run
    /// Default: 500 milliseconds
    pub pacing_interval: Duration,

    /// How long a cached record stays fresh
    /// Default: 24 hours
    pub cache_ttl: Duration,

    /// Whether to consult WHOIS proxies when RDAP yields nothing
    /// Default: true
    pub enable_whois_fallback: bool,

    /// Base URL of the generic RDAP proxy, ending in `/`
    pub generic_rdap_url: String,

    /// Extra or replacement TLD -> RDAP base URL entries
    pub rdap_overrides: HashMap<String, String>,

    /// Ordered WHOIS proxy list
    pub whois_providers: Vec<WhoisProvider>,

    /// User-Agent header sent to RDAP and WHOIS endpoints
    pub user_agent: String,

    /// Location of the durable cache file, if any
    pub cache_file: Option<std::path::PathBuf>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            dns_timeout: Duration::from_secs(5),
            pacing_interval: Duration::from_millis(500),
            cache_ttl: Duration::from_secs(24 * 3600),
            enable_whois_fallback: true,
            generic_rdap_url: GENERIC_RDAP_URL.to_string(),
            rdap_overrides: HashMap::new(),
            whois_providers: default_whois_providers(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_file: None,
        }
    }
}

impl ResolveConfig {
    /// Set the HTTP timeout for RDAP and WHOIS calls.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the DNS probe timeout.
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Set the delay between upstream lookups in bulk runs.
    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Set the cache staleness TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Enable or disable the WHOIS fallback.
    pub fn with_whois_fallback(mut self, enabled: bool) -> Self {
        self.enable_whois_fallback = enabled;
        self
    }

    /// Point the generic RDAP fallback somewhere else.
    pub fn with_generic_rdap_url(mut self, url: impl Into<String>) -> Self {
        self.generic_rdap_url = url.into();
        self
    }

    /// Add or replace a registry directory entry.
    pub fn with_rdap_endpoint(mut self, tld: &str, base_url: impl Into<String>) -> Self {
        self.rdap_overrides
            .insert(tld.trim_start_matches('.').to_lowercase(), base_url.into());
        self
    }

    /// Replace the WHOIS provider list.
    pub fn with_whois_providers(mut self, providers: Vec<WhoisProvider>) -> Self {
        self.whois_providers = providers;
        self
    }

    /// Use a durable cache file.
    pub fn with_cache_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }
}
