//! Cache-aware single and bulk lookups.
//!
//! `DomainHunter` is the entry point most callers want: it consults the
//! result cache before running the cascade, stores what the cascade produced,
//! and paces consecutive upstream lookups in bulk runs.

use crate::cache::ResultCache;
use crate::checker::DomainChecker;
use crate::error::DomainHunterError;
use crate::types::{BulkResult, CacheStats, DomainRecord, ResolveConfig};
use crate::utils::{unique_domains, validate_domain};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Domain monitoring service: orchestrator plus result cache.
///
/// # Example
///
/// ```rust,no_run
/// use domain_hunter_lib::{DomainHunter, ResolveConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let hunter = DomainHunter::from_config(&ResolveConfig::default()).await?;
///     let bulk = hunter.lookup_bulk(&["example.com", "example.org"]).await;
///     for record in bulk.results {
///         println!("{}: {}", record.domain, record.available);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainHunter {
    checker: DomainChecker,
    cache: ResultCache,
    /// Delay between orchestrator invocations within one bulk run
    pacing: Duration,
}

impl DomainHunter {
    pub fn new(checker: DomainChecker, cache: ResultCache, pacing: Duration) -> Self {
        Self {
            checker,
            cache,
            pacing,
        }
    }

    /// Build the production service.
    ///
    /// Uses the JSON file cache when `config.cache_file` is set and an
    /// in-memory cache otherwise.
    pub async fn from_config(config: &ResolveConfig) -> Result<Self, DomainHunterError> {
        let checker = DomainChecker::new(config)?;
        let cache = match &config.cache_file {
            Some(path) => ResultCache::open_file(path, config.cache_ttl).await?,
            None => ResultCache::in_memory(config.cache_ttl),
        };
        Ok(Self::new(checker, cache, config.pacing_interval))
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Look up one domain, serving a fresh cached record when there is one.
    ///
    /// Rejects input that is empty after trimming.
    pub async fn lookup(&self, domain: &str) -> Result<DomainRecord, DomainHunterError> {
        let domain = validate_domain(domain)?;
        match self.cached(&domain).await {
            Some(record) => Ok(record),
            None => Ok(self.resolve_and_store(&domain).await),
        }
    }

    /// Look up many domains sequentially.
    ///
    /// One record per unique, non-empty normalized input, in first-seen
    /// order. Cache hits are served without delay; consecutive orchestrator
    /// invocations are separated by the pacing interval.
    pub async fn lookup_bulk<S: AsRef<str>>(&self, domains: &[S]) -> BulkResult {
        self.lookup_bulk_with(domains, |_, _, _| {}).await
    }

    /// Like [`lookup_bulk`](Self::lookup_bulk), reporting each record as it
    /// is produced as `(position, total, record)`.
    pub async fn lookup_bulk_with<S, F>(&self, domains: &[S], mut on_record: F) -> BulkResult
    where
        S: AsRef<str>,
        F: FnMut(usize, usize, &DomainRecord),
    {
        let domains = unique_domains(domains);
        let total = domains.len();
        info!(total, "starting bulk lookup");

        let mut results = Vec::with_capacity(total);
        let mut resolved_before = false;

        for (index, domain) in domains.iter().enumerate() {
            let record = match self.cached(domain).await {
                Some(record) => record,
                None => {
                    if resolved_before && !self.pacing.is_zero() {
                        tokio::time::sleep(self.pacing).await;
                    }
                    resolved_before = true;
                    self.resolve_and_store(domain).await
                }
            };

            on_record(index + 1, total, &record);
            results.push(record);
        }

        BulkResult::new(results)
    }

    /// Cached records expiring within `days` days, soonest first.
    pub async fn expiring_soon(&self, days: i64) -> Result<Vec<DomainRecord>, DomainHunterError> {
        self.cache.expiring_within(days).await
    }

    pub async fn stats(&self) -> Result<CacheStats, DomainHunterError> {
        self.cache.stats(Utc::now()).await
    }

    /// Every cached record, sorted by domain.
    pub async fn list_all(&self) -> Result<Vec<DomainRecord>, DomainHunterError> {
        self.cache.list_all().await
    }

    /// Stop tracking a domain. Returns whether it was cached.
    pub async fn forget(&self, domain: &str) -> Result<bool, DomainHunterError> {
        let domain = validate_domain(domain)?;
        self.cache.delete(&domain).await
    }

    /// Drop every cached record; returns how many were removed.
    pub async fn clear(&self) -> Result<usize, DomainHunterError> {
        let removed = self.cache.clear().await?;
        info!(removed, "cache cleared");
        Ok(removed)
    }

    /// The whole cache as a JSON document in the cache file layout.
    pub async fn export_json(&self) -> Result<String, DomainHunterError> {
        self.cache.export_json().await
    }

    /// Merge an exported document into the cache; returns how many records
    /// were stored.
    pub async fn import_json(&self, content: &str) -> Result<usize, DomainHunterError> {
        self.cache.import_json(content).await
    }

    async fn cached(&self, domain: &str) -> Option<DomainRecord> {
        match self.cache.get_fresh(domain, Utc::now()).await {
            Ok(Some(record)) => {
                debug!(domain, "cache hit");
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(domain, error = %e, "cache read failed, resolving");
                None
            }
        }
    }

    async fn resolve_and_store(&self, domain: &str) -> DomainRecord {
        let record = self.checker.resolve(domain).await;
        if let Err(e) = self.cache.put(&record).await {
            warn!(domain, error = %e, "failed to store record in cache");
        }
        record
    }
}
