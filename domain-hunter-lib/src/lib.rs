//! # Domain Hunter Library
//!
//! Decides whether a domain is registered, who registered it and when it
//! expires, by cascading through RDAP, JSON WHOIS proxies and DNS.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_hunter_lib::{DomainHunter, ResolveConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hunter = DomainHunter::from_config(&ResolveConfig::default()).await?;
//!     let record = hunter.lookup("example.com").await?;
//!
//!     println!(
//!         "{}: available={} expires in {:?} days via {}",
//!         record.domain, record.available, record.days_left, record.method
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP first**: built-in registry directory, generic proxy fallback
//! - **WHOIS fallback**: pluggable JSON WHOIS proxies
//! - **DNS presence**: classifies domains no registry would talk about
//! - **Never fails per domain**: unexpected failures become error records
//! - **Result cache**: 24h freshness window, in memory or in a JSON file
//! - **Paced bulk runs**: ordered, de-duplicated, rate limited

// Re-export main public API types and functions
pub use cache::{JsonFileStore, MemoryStore, RecordStore, ResultCache};
pub use checker::DomainChecker;
pub use config::{
    env_config_from, load_env_config, parse_duration_string, ConfigManager, EnvConfig, FileConfig,
};
pub use error::DomainHunterError;
pub use monitor::DomainHunter;
pub use protocols::{
    extract_tld, get_all_known_tlds, parse_rdap_response, parse_whois_response, DnsProbe,
    PresenceProbe, RdapClient, RegistrationSource, RegistryDirectory, WhoisClient,
};
pub use types::{
    default_whois_providers, Availability, BulkResult, CacheStats, DomainRecord,
    RegistrationData, ResolutionMethod, ResolveConfig, WhoisProvider, DEFAULT_USER_AGENT,
    GENERIC_RDAP_URL, UNKNOWN_REGISTRAR,
};
pub use utils::{days_left, is_premium_domain, normalize_domain, unique_domains, validate_domain};

// Internal modules - these are not part of the public API
mod cache;
mod checker;
mod config;
mod error;
mod monitor;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainHunterError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
