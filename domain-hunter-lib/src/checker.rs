//! Resolution orchestrator.
//!
//! `DomainChecker` runs the cascade for one domain: RDAP, then WHOIS when RDAP
//! had nothing, then the DNS probe, which always runs. It always hands back a
//! record; unexpected failures and panics become `method: "error"` records.

use crate::error::DomainHunterError;
use crate::protocols::{DnsProbe, PresenceProbe, RdapClient, RegistrationSource, WhoisClient};
use crate::types::{DomainRecord, RegistrationData, ResolveConfig};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Composes the registration sources and the DNS probe into one decision
/// per domain.
///
/// # Example
///
/// ```rust,no_run
/// use domain_hunter_lib::{DomainChecker, ResolveConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new(&ResolveConfig::default())?;
///     let record = checker.resolve("example.com").await;
///     println!("{} -> {}", record.domain, record.available);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    rdap: Arc<dyn RegistrationSource>,
    /// `None` when the WHOIS fallback is disabled
    whois: Option<Arc<dyn RegistrationSource>>,
    dns: Arc<dyn PresenceProbe>,
}

impl DomainChecker {
    /// Build the production cascade from configuration.
    pub fn new(config: &ResolveConfig) -> Result<Self, DomainHunterError> {
        let rdap: Arc<dyn RegistrationSource> = Arc::new(RdapClient::with_config(config)?);

        let whois: Option<Arc<dyn RegistrationSource>> =
            if config.enable_whois_fallback && !config.whois_providers.is_empty() {
                Some(Arc::new(WhoisClient::with_config(config)?))
            } else {
                None
            };

        let dns: Arc<dyn PresenceProbe> = Arc::new(DnsProbe::with_config(config));

        Ok(Self::from_parts(rdap, whois, dns))
    }

    /// Assemble a checker from arbitrary sources.
    pub fn from_parts(
        rdap: Arc<dyn RegistrationSource>,
        whois: Option<Arc<dyn RegistrationSource>>,
        dns: Arc<dyn PresenceProbe>,
    ) -> Self {
        Self { rdap, whois, dns }
    }

    pub fn has_whois_fallback(&self) -> bool {
        self.whois.is_some()
    }

    /// Resolve one normalized domain into a canonical record.
    ///
    /// Never fails. Errors returned by a source and panics inside the cascade
    /// are logged and turned into an error record.
    pub async fn resolve(&self, domain: &str) -> DomainRecord {
        match AssertUnwindSafe(self.run_cascade(domain)).catch_unwind().await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!(domain, error = %e, "resolution failed");
                DomainRecord::error(domain, Utc::now())
            }
            Err(panic) => {
                error!(domain, panic = panic_message(&*panic), "resolver panicked");
                DomainRecord::error(domain, Utc::now())
            }
        }
    }

    async fn run_cascade(&self, domain: &str) -> Result<DomainRecord, DomainHunterError> {
        let mut registration = query_source(self.rdap.as_ref(), domain).await?;

        if registration.is_none() {
            if let Some(whois) = &self.whois {
                debug!(domain, "RDAP gave no result, trying WHOIS proxies");
                registration = query_source(whois.as_ref(), domain).await?;
            }
        }

        let has_dns = self.dns.has_dns(domain).await?;
        let now = Utc::now();

        let record = match registration {
            Some(data) => DomainRecord::registered(domain, has_dns, data, now),
            None => DomainRecord::from_dns(domain, has_dns, now),
        };

        debug!(
            domain,
            method = %record.method,
            available = %record.available,
            has_dns,
            "domain resolved"
        );
        Ok(record)
    }
}

/// Ask one registration source. Upstream errors mean "no result here";
/// anything else fails the lookup.
async fn query_source(
    source: &dyn RegistrationSource,
    domain: &str,
) -> Result<Option<RegistrationData>, DomainHunterError> {
    match source.lookup(domain).await {
        Err(e) if e.is_upstream() => {
            debug!(domain, source = %source.method(), error = %e, "upstream error, falling through");
            Ok(None)
        }
        outcome => outcome,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
