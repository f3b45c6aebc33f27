//! Configuration file parsing and management.
//!
//! Settings come from TOML files and `DH_*` environment variables and are
//! layered onto [`ResolveConfig`] in this order: built-in defaults, config
//! file, environment. Command-line flags are applied last by the binary.

use crate::error::DomainHunterError;
use crate::types::{ResolveConfig, WhoisProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// File names looked up in the working directory, highest precedence first.
const LOCAL_CONFIG_NAMES: [&str; 2] = ["domain-hunter.toml", ".domain-hunter.toml"];

/// File names looked up in the home directory.
const GLOBAL_CONFIG_NAMES: [&str; 2] = [".domain-hunter.toml", "domain-hunter.toml"];

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// http_timeout = "10s"
/// dns_timeout = "5s"
/// pacing_ms = 500
/// cache_ttl_hours = 24
/// whois_fallback = true
///
/// [cache]
/// path = "data/domains.json"
///
/// [rdap]
/// generic_url = "https://rdap.org/domain/"
///
/// [rdap.endpoints]
/// co = "https://rdap.example/co/domain/"
///
/// [[whois.providers]]
/// name = "whoisxmlapi"
/// url = "https://www.whoisxmlapi.com/whoisserver/WhoisService?apiKey={api_key}&domainName={domain}&outputFormat=JSON"
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap: Option<RdapConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisConfig>,
}

/// Resolution and pacing defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// RDAP/WHOIS timeout (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout: Option<String>,

    /// DNS probe timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_timeout: Option<String>,

    /// Delay between upstream lookups in bulk runs, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing_ms: Option<u64>,

    /// Cache freshness window in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_hours: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_fallback: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheConfig {
    /// Location of the JSON cache file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RdapConfig {
    /// Generic RDAP proxy base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_url: Option<String>,

    /// Extra or replacement TLD -> RDAP base URL entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WhoisConfig {
    /// Replaces the built-in provider list when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<WhoisProvider>>,
}

impl FileConfig {
    /// Layer this file's settings over `config`.
    ///
    /// Expects a validated configuration; unparseable durations are skipped.
    pub fn apply_to(&self, mut config: ResolveConfig) -> ResolveConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(timeout) = defaults.http_timeout.as_deref().and_then(parse_duration_string) {
                config.http_timeout = timeout;
            }
            if let Some(timeout) = defaults.dns_timeout.as_deref().and_then(parse_duration_string) {
                config.dns_timeout = timeout;
            }
            if let Some(pacing_ms) = defaults.pacing_ms {
                config.pacing_interval = Duration::from_millis(pacing_ms);
            }
            if let Some(ttl) = defaults.cache_ttl_hours.and_then(ttl_from_hours) {
                config.cache_ttl = ttl;
            }
            if let Some(enabled) = defaults.whois_fallback {
                config.enable_whois_fallback = enabled;
            }
        }

        if let Some(path) = self.cache.as_ref().and_then(|c| c.path.as_ref()) {
            config.cache_file = Some(PathBuf::from(path));
        }

        if let Some(rdap) = &self.rdap {
            if let Some(url) = &rdap.generic_url {
                config.generic_rdap_url = with_trailing_slash(url);
            }
            if let Some(endpoints) = &rdap.endpoints {
                for (tld, url) in endpoints {
                    config = config.with_rdap_endpoint(tld, with_trailing_slash(url));
                }
            }
        }

        if let Some(providers) = self.whois.as_ref().and_then(|w| w.providers.clone()) {
            config.whois_providers = providers;
        }

        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    working_dir: PathBuf,
    home_dir: Option<PathBuf>,
    xdg_config_dir: Option<PathBuf>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Discover config files relative to the current directory, `$HOME` and
    /// `$XDG_CONFIG_HOME`.
    pub fn new() -> Self {
        let home_dir = env::var_os("HOME").map(PathBuf::from);
        let xdg_config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home_dir.as_ref().map(|home| home.join(".config")));

        Self {
            working_dir: PathBuf::from("."),
            home_dir,
            xdg_config_dir,
        }
    }

    /// Discover config files under explicit directories.
    pub fn with_dirs(
        working_dir: impl Into<PathBuf>,
        home_dir: Option<PathBuf>,
        xdg_config_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            home_dir,
            xdg_config_dir,
        }
    }

    /// Load and validate one configuration file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainHunterError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainHunterError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainHunterError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        validate_config(&config)?;

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load the explicit file when given, otherwise discover one.
    pub fn load(&self, explicit: Option<&Path>) -> Result<FileConfig, DomainHunterError> {
        match explicit {
            Some(path) => self.load_file(path),
            None => self.discover_and_load(),
        }
    }

    /// Discover and merge configuration files in precedence order.
    ///
    /// XDG config is the lowest layer, then the home directory, then the
    /// working directory. A file that fails to load is reported and skipped.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainHunterError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.xdg_config_path(),
            self.global_config_path(),
            self.local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring configuration file"),
            }
        }

        if loaded_files.len() > 1 {
            info!(
                files = ?loaded_files,
                "multiple configuration files found, later files take precedence"
            );
        }

        Ok(merged_config)
    }

    fn local_config_path(&self) -> Option<PathBuf> {
        LOCAL_CONFIG_NAMES
            .iter()
            .map(|name| self.working_dir.join(name))
            .find(|path| path.exists())
    }

    fn global_config_path(&self) -> Option<PathBuf> {
        let home = self.home_dir.as_ref()?;
        GLOBAL_CONFIG_NAMES
            .iter()
            .map(|name| home.join(name))
            .find(|path| path.exists())
    }

    fn xdg_config_path(&self) -> Option<PathBuf> {
        let path = self
            .xdg_config_dir
            .as_ref()?
            .join("domain-hunter")
            .join("config.toml");
        path.exists().then_some(path)
    }
}

/// Merge two configurations; values from `higher` win.
fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        defaults: match (lower.defaults, higher.defaults) {
            (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                http_timeout: higher_defaults.http_timeout.or(lower_defaults.http_timeout),
                dns_timeout: higher_defaults.dns_timeout.or(lower_defaults.dns_timeout),
                pacing_ms: higher_defaults.pacing_ms.or(lower_defaults.pacing_ms),
                cache_ttl_hours: higher_defaults.cache_ttl_hours.or(lower_defaults.cache_ttl_hours),
                whois_fallback: higher_defaults.whois_fallback.or(lower_defaults.whois_fallback),
            }),
            (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
        },
        cache: match (lower.cache, higher.cache) {
            (Some(lower_cache), Some(higher_cache)) => Some(CacheConfig {
                path: higher_cache.path.or(lower_cache.path),
            }),
            (lower_cache, higher_cache) => higher_cache.or(lower_cache),
        },
        rdap: match (lower.rdap, higher.rdap) {
            (Some(lower_rdap), Some(higher_rdap)) => Some(RdapConfig {
                generic_url: higher_rdap.generic_url.or(lower_rdap.generic_url),
                endpoints: match (lower_rdap.endpoints, higher_rdap.endpoints) {
                    (Some(mut lower_endpoints), Some(higher_endpoints)) => {
                        lower_endpoints.extend(higher_endpoints);
                        Some(lower_endpoints)
                    }
                    (lower_endpoints, higher_endpoints) => higher_endpoints.or(lower_endpoints),
                },
            }),
            (lower_rdap, higher_rdap) => higher_rdap.or(lower_rdap),
        },
        // Provider lists replace each other wholesale; order matters.
        whois: match (lower.whois, higher.whois) {
            (Some(lower_whois), Some(higher_whois)) => Some(WhoisConfig {
                providers: higher_whois.providers.or(lower_whois.providers),
            }),
            (lower_whois, higher_whois) => higher_whois.or(lower_whois),
        },
    }
}

/// Validate a configuration for common issues.
fn validate_config(config: &FileConfig) -> Result<(), DomainHunterError> {
    if let Some(defaults) = &config.defaults {
        for (field, value) in [
            ("http_timeout", &defaults.http_timeout),
            ("dns_timeout", &defaults.dns_timeout),
        ] {
            if let Some(timeout_str) = value {
                match parse_duration_string(timeout_str) {
                    Some(timeout) if !timeout.is_zero() => {}
                    _ => {
                        return Err(DomainHunterError::config(format!(
                            "Invalid {} '{}'. Use format like '500ms', '5s', '2m'",
                            field, timeout_str
                        )))
                    }
                }
            }
        }

        if let Some(hours) = defaults.cache_ttl_hours {
            if ttl_from_hours(hours).is_none() {
                return Err(DomainHunterError::config(format!(
                    "cache_ttl_hours must be between 1 and {}, got {}",
                    u64::MAX / SECS_PER_HOUR,
                    hours
                )));
            }
        }
    }

    if let Some(path) = config.cache.as_ref().and_then(|c| c.path.as_ref()) {
        if path.trim().is_empty() {
            return Err(DomainHunterError::config("Cache path cannot be empty"));
        }
    }

    if let Some(rdap) = &config.rdap {
        if let Some(url) = &rdap.generic_url {
            validate_url("rdap.generic_url", url)?;
        }
        for (tld, url) in rdap.endpoints.iter().flatten() {
            let tld = tld.trim_start_matches('.');
            if tld.is_empty() || tld.contains('.') || tld.contains(' ') {
                return Err(DomainHunterError::config(format!(
                    "Invalid TLD '{}' in rdap.endpoints",
                    tld
                )));
            }
            validate_url(&format!("rdap.endpoints.{}", tld), url)?;
        }
    }

    if let Some(providers) = config.whois.as_ref().and_then(|w| w.providers.as_ref()) {
        for provider in providers {
            if provider.name.trim().is_empty() {
                return Err(DomainHunterError::config("WHOIS provider names cannot be empty"));
            }
            validate_url(&format!("whois provider '{}'", provider.name), &provider.url)?;
            if !provider.url.contains("{domain}") {
                return Err(DomainHunterError::config(format!(
                    "WHOIS provider '{}' URL must contain a {{domain}} placeholder",
                    provider.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), DomainHunterError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(DomainHunterError::config(format!(
            "Invalid URL '{}' for {}: must start with http:// or https://",
            url, field
        )))
    }
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Settings taken from `DH_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub http_timeout: Option<Duration>,
    pub dns_timeout: Option<Duration>,
    pub pacing_interval: Option<Duration>,
    pub cache_ttl: Option<Duration>,
    pub cache_file: Option<PathBuf>,
    pub whois_fallback: Option<bool>,
    /// Substituted into every provider URL that takes an `{api_key}`
    pub whois_api_key: Option<String>,
    /// Explicit config file path
    pub config: Option<PathBuf>,
}

impl EnvConfig {
    /// Layer the environment settings over `config`.
    pub fn apply_to(&self, mut config: ResolveConfig) -> ResolveConfig {
        if let Some(timeout) = self.http_timeout {
            config.http_timeout = timeout;
        }
        if let Some(timeout) = self.dns_timeout {
            config.dns_timeout = timeout;
        }
        if let Some(pacing) = self.pacing_interval {
            config.pacing_interval = pacing;
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache_ttl = ttl;
        }
        if let Some(path) = &self.cache_file {
            config.cache_file = Some(path.clone());
        }
        if let Some(enabled) = self.whois_fallback {
            config.enable_whois_fallback = enabled;
        }
        if let Some(api_key) = &self.whois_api_key {
            for provider in config
                .whois_providers
                .iter_mut()
                .filter(|p| p.url.contains("{api_key}"))
            {
                provider.api_key = Some(api_key.clone());
            }
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|name| env::var(name).ok())
}

/// Build an [`EnvConfig`] from an arbitrary variable lookup.
pub fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    let timeout_var = |name: &str| -> Option<Duration> {
        let value = lookup(name)?;
        match parse_duration_string(&value) {
            Some(timeout) if !timeout.is_zero() => {
                debug!("Using {}={}", name, value);
                Some(timeout)
            }
            _ => {
                warn!("Invalid {}='{}', use format like '5s', '30s', '2m'", name, value);
                None
            }
        }
    };
    env_config.http_timeout = timeout_var("DH_HTTP_TIMEOUT");
    env_config.dns_timeout = timeout_var("DH_DNS_TIMEOUT");

    if let Some(value) = lookup("DH_PACING_MS") {
        match value.trim().parse::<u64>() {
            Ok(ms) => env_config.pacing_interval = Some(Duration::from_millis(ms)),
            Err(_) => warn!("Invalid DH_PACING_MS='{}', must be a number of milliseconds", value),
        }
    }

    if let Some(value) = lookup("DH_CACHE_TTL_HOURS") {
        match value.trim().parse::<u64>().ok().and_then(ttl_from_hours) {
            Some(ttl) => env_config.cache_ttl = Some(ttl),
            None => warn!("Invalid DH_CACHE_TTL_HOURS='{}', must be a positive number of hours", value),
        }
    }

    if let Some(value) = lookup("DH_CACHE_FILE") {
        if !value.trim().is_empty() {
            env_config.cache_file = Some(PathBuf::from(value.trim()));
        }
    }

    if let Some(value) = lookup("DH_WHOIS_FALLBACK") {
        match parse_bool(&value) {
            Some(enabled) => env_config.whois_fallback = Some(enabled),
            None => warn!("Invalid DH_WHOIS_FALLBACK='{}', use true/false", value),
        }
    }

    if let Some(value) = lookup("DH_WHOIS_API_KEY") {
        if !value.trim().is_empty() {
            env_config.whois_api_key = Some(value.trim().to_string());
        }
    }

    if let Some(value) = lookup("DH_CONFIG") {
        if !value.trim().is_empty() {
            env_config.config = Some(PathBuf::from(value.trim()));
        }
    }

    env_config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

const SECS_PER_HOUR: u64 = 3600;

/// Cache TTL for a whole number of hours. `None` for zero or on overflow.
fn ttl_from_hours(hours: u64) -> Option<Duration> {
    match hours.checked_mul(SECS_PER_HOUR) {
        Some(0) | None => None,
        Some(secs) => Some(Duration::from_secs(secs)),
    }
}

/// Parse a duration string like "500ms", "5s", "2m" or "1h".
///
/// A bare number is taken as seconds.
pub fn parse_duration_string(duration_str: &str) -> Option<Duration> {
    let duration_str = duration_str.trim().to_lowercase();

    if let Some(ms) = duration_str.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = duration_str.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = duration_str.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(hours) = duration_str.strip_suffix('h') {
        hours.parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(SECS_PER_HOUR))
            .map(Duration::from_secs)
    } else {
        duration_str.parse::<u64>().ok().map(Duration::from_secs)
    }
}
