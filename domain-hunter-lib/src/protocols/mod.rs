//! Upstream data sources used by the resolution cascade.
//!
//! Each source sits behind a small trait so the orchestrator can be driven by
//! fakes in tests and so WHOIS providers can be swapped out.

/// RDAP (Registration Data Access Protocol) resolver
pub mod rdap;

/// JSON WHOIS proxy fallback resolver
pub mod whois;

/// DNS presence probe
pub mod dns;

/// TLD -> RDAP endpoint directory
pub mod registry;

use crate::error::DomainHunterError;
use crate::types::{RegistrationData, ResolutionMethod};
use async_trait::async_trait;

pub use dns::DnsProbe;
pub use rdap::{parse_rdap_response, RdapClient};
pub use registry::{extract_tld, get_all_known_tlds, RegistryDirectory};
pub use whois::{parse_whois_response, WhoisClient};

/// A source of registration data (expiration date and registrar).
///
/// `Ok(None)` means "nothing usable here, try the next source". Upstream
/// outages and unparseable responses belong in that bucket. `Err` is kept for
/// conditions the caller should treat as a failed lookup.
#[async_trait]
pub trait RegistrationSource: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<Option<RegistrationData>, DomainHunterError>;

    /// Which method records produced from this source carry.
    fn method(&self) -> ResolutionMethod;
}

/// Whether a domain currently resolves in DNS.
#[async_trait]
pub trait PresenceProbe: Send + Sync {
    /// `Ok(false)` for any name-resolution failure, including timeouts.
    async fn has_dns(&self, domain: &str) -> Result<bool, DomainHunterError>;
}
