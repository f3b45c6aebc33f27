//! Result cache.
//!
//! Records are keyed by normalized domain and trusted for a fixed TTL after
//! `lastChecked`. Storage sits behind [`RecordStore`]: an in-memory map for
//! tests and embedding, and a JSON document on disk for the CLI.

use crate::error::DomainHunterError;
use crate::types::{Availability, CacheStats, DomainRecord};
use crate::utils::{is_premium_domain, normalize_domain};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Persistence collaborator for canonical records.
///
/// Keys are normalized domains. Writes to the same key are last-write-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, DomainHunterError>;

    async fn put(&self, domain: &str, record: DomainRecord) -> Result<(), DomainHunterError>;

    /// Returns whether a record was removed.
    async fn delete(&self, domain: &str) -> Result<bool, DomainHunterError>;

    /// Every stored record, in key order.
    async fn list_all(&self) -> Result<Vec<DomainRecord>, DomainHunterError>;

    /// Drop everything; returns how many records were removed.
    async fn clear(&self) -> Result<usize, DomainHunterError>;

    /// Store several records, each under its own domain. Returns how many
    /// were written.
    async fn put_many(&self, records: Vec<DomainRecord>) -> Result<usize, DomainHunterError> {
        let count = records.len();
        for record in records {
            let key = record.domain.clone();
            self.put(&key, record).await?;
        }
        Ok(count)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, DomainRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, DomainHunterError> {
        Ok(self.records.read().await.get(domain).cloned())
    }

    async fn put(&self, domain: &str, record: DomainRecord) -> Result<(), DomainHunterError> {
        self.records.write().await.insert(domain.to_string(), record);
        Ok(())
    }

    async fn delete(&self, domain: &str) -> Result<bool, DomainHunterError> {
        Ok(self.records.write().await.remove(domain).is_some())
    }

    async fn list_all(&self) -> Result<Vec<DomainRecord>, DomainHunterError> {
        let mut records: Vec<DomainRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(records)
    }

    async fn clear(&self) -> Result<usize, DomainHunterError> {
        let mut records = self.records.write().await;
        let removed = records.len();
        records.clear();
        Ok(removed)
    }
}

/// On-disk layout of [`JsonFileStore`], also used for exports.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: BTreeMap<String, DomainRecord>,
}

/// Durable store: one pretty-printed JSON document holding every record.
///
/// The document is loaded once on open and rewritten after each mutation
/// through a temporary file and a rename, so readers of the file never see a
/// half-written document. Mutations are serialized.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, DomainRecord>>,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainHunterError> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => {
                let document: StoreDocument = serde_json::from_str(&content).map_err(|e| {
                    DomainHunterError::storage(format!(
                        "Cache file {} is not valid: {}",
                        path.display(),
                        e
                    ))
                })?;
                document.records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(DomainHunterError::storage(format!(
                    "Failed to read cache file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        debug!(path = %path.display(), records = records.len(), "cache file loaded");

        Ok(Self {
            path,
            records: RwLock::new(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the records, write it to disk, then
    /// publish it. On a failed write the in-memory records stay as they were.
    async fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut BTreeMap<String, DomainRecord>) -> T,
    ) -> Result<T, DomainHunterError> {
        let _guard = self.write_lock.lock().await;

        let mut document = StoreDocument {
            records: self.records.read().await.clone(),
        };
        let outcome = mutate(&mut document.records);

        self.persist(&document).await?;
        *self.records.write().await = document.records;
        Ok(outcome)
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), DomainHunterError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainHunterError::storage(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(document)?;

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        tokio::fs::write(&temp_path, content).await.map_err(|e| {
            DomainHunterError::storage(format!(
                "Failed to write cache file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            DomainHunterError::storage(format!(
                "Failed to replace cache file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, DomainHunterError> {
        Ok(self.records.read().await.get(domain).cloned())
    }

    async fn put(&self, domain: &str, record: DomainRecord) -> Result<(), DomainHunterError> {
        let key = domain.to_string();
        self.mutate(move |records| {
            records.insert(key, record);
        })
        .await
    }

    async fn put_many(&self, records: Vec<DomainRecord>) -> Result<usize, DomainHunterError> {
        let count = records.len();
        self.mutate(move |stored| {
            for record in records {
                stored.insert(record.domain.clone(), record);
            }
        })
        .await?;
        Ok(count)
    }

    async fn delete(&self, domain: &str) -> Result<bool, DomainHunterError> {
        if !self.records.read().await.contains_key(domain) {
            return Ok(false);
        }
        self.mutate(|records| records.remove(domain).is_some()).await
    }

    async fn list_all(&self) -> Result<Vec<DomainRecord>, DomainHunterError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> Result<usize, DomainHunterError> {
        self.mutate(|records| {
            let removed = records.len();
            records.clear();
            removed
        })
        .await
    }
}

/// TTL-aware view over a [`RecordStore`].
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn RecordStore>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cache backed by a fresh [`MemoryStore`].
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl)
    }

    /// Cache backed by the JSON document at `path`.
    pub async fn open_file(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self, DomainHunterError> {
        let store = JsonFileStore::open(path).await?;
        info!(path = %store.path().display(), "using cache file");
        Ok(Self::new(Arc::new(store), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The stored record, regardless of age.
    pub async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, DomainHunterError> {
        self.store.get(domain).await
    }

    /// The stored record if it is still fresh at `now`.
    pub async fn get_fresh(
        &self,
        domain: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DomainRecord>, DomainHunterError> {
        Ok(self
            .store
            .get(domain)
            .await?
            .filter(|record| record.is_fresh(self.ttl, now)))
    }

    /// Store a record under its own domain.
    pub async fn put(&self, record: &DomainRecord) -> Result<(), DomainHunterError> {
        self.store.put(&record.domain, record.clone()).await
    }

    pub async fn delete(&self, domain: &str) -> Result<bool, DomainHunterError> {
        self.store.delete(domain).await
    }

    pub async fn clear(&self) -> Result<usize, DomainHunterError> {
        self.store.clear().await
    }

    /// Every cached record, sorted by domain.
    pub async fn list_all(&self) -> Result<Vec<DomainRecord>, DomainHunterError> {
        let mut records = self.store.list_all().await?;
        records.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(records)
    }

    /// Cached records with `0 <= daysLeft <= days`, soonest first.
    pub async fn expiring_within(&self, days: i64) -> Result<Vec<DomainRecord>, DomainHunterError> {
        let mut records: Vec<DomainRecord> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|record| matches!(record.days_left, Some(left) if (0..=days).contains(&left)))
            .collect();

        records.sort_by(|a, b| {
            a.days_left
                .cmp(&b.days_left)
                .then_with(|| a.domain.cmp(&b.domain))
        });
        Ok(records)
    }

    /// Every cached record as a pretty-printed document in the cache file
    /// layout, so an export can also be opened directly as a cache file.
    pub async fn export_json(&self) -> Result<String, DomainHunterError> {
        let records: BTreeMap<String, DomainRecord> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .map(|record| (record.domain.clone(), record))
            .collect();
        Ok(serde_json::to_string_pretty(&StoreDocument { records })?)
    }

    /// Merge the records of an exported document into the cache.
    ///
    /// Keys are normalized and win over the `domain` field of their record;
    /// entries with an empty key are skipped. Returns how many records were
    /// stored.
    pub async fn import_json(&self, content: &str) -> Result<usize, DomainHunterError> {
        let document: StoreDocument = serde_json::from_str(content).map_err(|e| {
            DomainHunterError::storage(format!("Import document is not valid: {}", e))
        })?;

        let mut records = BTreeMap::new();
        for (key, mut record) in document.records {
            match normalize_domain(&key) {
                Some(domain) => {
                    record.domain = domain.clone();
                    records.insert(domain, record);
                }
                None => warn!(key = %key, "skipping imported record without a domain"),
            }
        }

        let imported = self.store.put_many(records.into_values().collect()).await?;
        info!(imported, "imported cache records");
        Ok(imported)
    }

    /// Summary counts over every cached record.
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<CacheStats, DomainHunterError> {
        let records = self.store.list_all().await?;
        Ok(summarize(&records, self.ttl, now))
    }
}

fn summarize(records: &[DomainRecord], ttl: Duration, now: DateTime<Utc>) -> CacheStats {
    let mut stats = CacheStats {
        total: records.len(),
        ..CacheStats::default()
    };

    for record in records {
        match record.available {
            Availability::Available => stats.available += 1,
            Availability::Taken => stats.taken += 1,
            Availability::Unknown => stats.unknown += 1,
        }

        match record.days_left {
            Some(left) if left <= 0 => stats.expired += 1,
            Some(1..=30) => stats.expiring_30 += 1,
            Some(31..=90) => stats.expiring_90 += 1,
            _ => {}
        }

        if !record.is_fresh(ttl, now) {
            stats.stale += 1;
        }

        if is_premium_domain(&record.domain) {
            stats.premium += 1;
        }
    }

    stats
}
