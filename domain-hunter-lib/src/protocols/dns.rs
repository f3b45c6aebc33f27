//! DNS presence probe.
//!
//! A domain that resolves is in use, whatever the registries say. The probe
//! never supplies an expiration date; it only decides `hasDNS`.

use crate::error::DomainHunterError;
use crate::protocols::PresenceProbe;
use crate::types::ResolveConfig;
use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded-time address lookup over the system's upstream resolvers.
///
/// Name servers come from the host configuration (`/etc/resolv.conf` or the
/// platform equivalent). Public resolvers are only used when that
/// configuration cannot be read.
#[derive(Clone)]
pub struct DnsProbe {
    resolver: TokioResolver,
    timeout: Duration,
    system_config: bool,
}

impl DnsProbe {
    /// Create a probe with the default 5 second timeout.
    pub fn new() -> Self {
        Self::with_timeout(ResolveConfig::default().dns_timeout)
    }

    pub fn with_config(config: &ResolveConfig) -> Self {
        Self::with_timeout(config.dns_timeout)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        let (builder, system_config) = match TokioResolver::builder_tokio() {
            Ok(builder) => (builder, true),
            Err(e) => {
                warn!(error = %e, "system DNS configuration unavailable, using public resolvers");
                let provider = TokioConnectionProvider::default();
                (
                    TokioResolver::builder_with_config(ResolverConfig::default(), provider),
                    false,
                )
            }
        };
        let resolver = builder.with_options(opts).build();

        Self {
            resolver,
            timeout,
            system_config,
        }
    }

    /// Whether the probe queries the host's configured name servers.
    pub fn uses_system_config(&self) -> bool {
        self.system_config
    }

    /// Whether the domain has A or AAAA records.
    ///
    /// Every failure mode (NXDOMAIN, no records, SERVFAIL, timeout) reads as
    /// `false`.
    pub async fn resolves(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }

        // Fully qualified so resolv.conf search domains are never appended.
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        match tokio::time::timeout(self.timeout, self.resolver.lookup_ip(fqdn)).await {
            Ok(Ok(lookup)) => {
                let found = lookup.iter().next().is_some();
                debug!(domain, found, "DNS lookup finished");
                found
            }
            Ok(Err(e)) => {
                debug!(domain, error = %e, "DNS lookup failed");
                false
            }
            Err(_) => {
                debug!(domain, timeout = ?self.timeout, "DNS lookup timed out");
                false
            }
        }
    }
}

impl Default for DnsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceProbe for DnsProbe {
    async fn has_dns(&self, domain: &str) -> Result<bool, DomainHunterError> {
        Ok(self.resolves(domain).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uses_host_resolvers_when_configured() {
        let has_nameserver = std::fs::read_to_string("/etc/resolv.conf")
            .map(|conf| conf.lines().any(|l| l.trim_start().starts_with("nameserver")))
            .unwrap_or(false);
        if !has_nameserver {
            return;
        }
        let probe = DnsProbe::with_timeout(Duration::from_millis(200));
        assert!(probe.uses_system_config());
    }

    #[tokio::test]
    async fn test_empty_name_does_not_resolve() {
        let probe = DnsProbe::with_timeout(Duration::from_millis(200));
        assert!(!probe.resolves("").await);
    }

    #[tokio::test]
    async fn test_reserved_tld_does_not_resolve() {
        // `.invalid` is reserved (RFC 2606); offline runs fail fast or time out.
        let probe = DnsProbe::with_timeout(Duration::from_millis(500));
        assert!(!probe.resolves("no-such-name.invalid").await);
        assert!(!probe.has_dns("no-such-name.invalid").await.unwrap());
    }
}
