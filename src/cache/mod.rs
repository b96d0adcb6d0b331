//! On-disk cache of detail extractions
//!
//! One JSON file per key under the cache directory, named by the hex xxh3
//! digest of the key. Each file holds the extracted fields plus a
//! `_cached_at` epoch timestamp. Every filesystem operation runs under a
//! single lock; failures are logged and surface as cache misses.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_128;

use crate::config::LookupConfig;
use crate::models::DetailFields;
use crate::utils::extract_tax_code_from_url;

const ENTRY_EXTENSION: &str = "json";

/// Cache key for a detail reference: its trailing tax code when present,
/// the reference itself otherwise
#[must_use]
pub fn cache_key(detail_ref: &str) -> String {
    extract_tax_code_from_url(detail_ref).unwrap_or_else(|| detail_ref.to_string())
}

fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    #[serde(flatten)]
    fields: DetailFields,
    #[serde(rename = "_cached_at", default)]
    cached_at: f64,
}

/// Only the timestamp, for scans that do not need the fields
#[derive(Deserialize)]
struct CacheStamp {
    #[serde(rename = "_cached_at", default)]
    cached_at: f64,
}

/// A cache file found during a directory scan
struct EntryFile {
    path: PathBuf,
    size: u64,
    /// `None` when the file could not be parsed
    cached_at: Option<f64>,
}

/// Outcome of a pruning pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PruneStats {
    pub deleted_count: usize,
    pub freed_bytes: u64,
    pub current_size_bytes: u64,
    pub current_count: usize,
}

/// Persistent result cache
#[derive(Debug)]
pub struct ResultCache {
    dir: PathBuf,
    expiry: Duration,
    max_size_bytes: u64,
    cleanup: bool,
    lock: Mutex<()>,
}

impl ResultCache {
    /// Create a cache rooted at `dir`. The directory is created on demand.
    pub fn new(dir: impl Into<PathBuf>, expiry: Duration, max_size_bytes: u64, cleanup: bool) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to create cache directory");
        }
        Self {
            dir,
            expiry,
            max_size_bytes,
            cleanup,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(
            config.cache_dir(),
            config.cache_expiry(),
            config.cache_max_size_bytes(),
            config.cache_enable_cleanup(),
        )
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = hex::encode(xxh3_128(key.as_bytes()).to_be_bytes());
        self.dir.join(format!("{digest}.{ENTRY_EXTENSION}"))
    }

    fn is_expired(&self, cached_at: f64, now: f64) -> bool {
        now - cached_at > self.expiry.as_secs_f64()
    }

    /// Fields stored under `key`, if present and fresh. A stale entry is
    /// deleted.
    pub fn get(&self, key: &str) -> Option<DetailFields> {
        let _guard = self.lock.lock();
        let path = self.entry_path(key);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return None;
            }
        };
        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "Malformed cache entry");
                return None;
            }
        };

        if self.is_expired(record.cached_at, now_epoch_secs()) {
            debug!(key, "Cache entry expired");
            if let Err(e) = fs::remove_file(&path) {
                warn!(key, error = %e, "Failed to remove expired cache entry");
            }
            return None;
        }

        debug!(key, "Cache hit");
        Some(record.fields)
    }

    /// Store `fields` under `key`, then clean up when enabled
    pub fn set(&self, key: &str, fields: &DetailFields) {
        let _guard = self.lock.lock();
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create cache directory");
            return;
        }

        let record = CacheRecord {
            fields: fields.clone(),
            cached_at: now_epoch_secs(),
        };
        let json = match serde_json::to_string_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = fs::write(self.entry_path(key), json) {
            warn!(key, error = %e, "Failed to write cache entry");
            return;
        }
        debug!(key, "Cached detail fields");

        if self.cleanup {
            self.cleanup_locked();
        }
    }

    /// Delete every entry. Returns the number of files removed.
    pub fn clear(&self) -> usize {
        let _guard = self.lock.lock();
        let deleted = self
            .entry_paths()
            .into_iter()
            .filter(|path| fs::remove_file(path).is_ok())
            .count();
        info!(deleted, "Cleared cache");
        deleted
    }

    /// Run the cleanup pass and report what it did
    pub fn prune(&self) -> PruneStats {
        let _guard = self.lock.lock();
        let (initial_size, initial_count) = self.totals();
        self.cleanup_locked();
        let (current_size_bytes, current_count) = self.totals();

        PruneStats {
            deleted_count: initial_count.saturating_sub(current_count),
            freed_bytes: initial_size.saturating_sub(current_size_bytes),
            current_size_bytes,
            current_count,
        }
    }

    /// Total size of all entry files
    pub fn size_bytes(&self) -> u64 {
        let _guard = self.lock.lock();
        self.totals().0
    }

    pub fn entry_count(&self) -> usize {
        let _guard = self.lock.lock();
        self.entry_paths().len()
    }

    fn entry_paths(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect()
    }

    fn totals(&self) -> (u64, usize) {
        self.entry_paths()
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .fold((0, 0), |(size, count), meta| (size + meta.len(), count + 1))
    }

    fn scan(&self) -> Vec<EntryFile> {
        self.entry_paths()
            .into_iter()
            .filter_map(|path| {
                let size = fs::metadata(&path).ok()?.len();
                let cached_at = fs::read_to_string(&path)
                    .ok()
                    .and_then(|raw| serde_json::from_str::<CacheStamp>(&raw).ok())
                    .map(|stamp| stamp.cached_at);
                Some(EntryFile { path, size, cached_at })
            })
            .collect()
    }

    /// Under the cap only expired entries go. Over it, entries are removed
    /// oldest first until the total fits, along with any expired entry met on
    /// the way. Callers hold the lock.
    fn cleanup_locked(&self) {
        let now = now_epoch_secs();
        let mut entries = self.scan();
        let total: u64 = entries.iter().map(|e| e.size).sum();

        if total <= self.max_size_bytes {
            let deleted = entries
                .iter()
                .filter(|e| e.cached_at.is_some_and(|at| self.is_expired(at, now)))
                .filter(|e| fs::remove_file(&e.path).is_ok())
                .count();
            if deleted > 0 {
                debug!(deleted, "Removed expired cache entries");
            }
            return;
        }

        info!(
            size_bytes = total,
            max_size_bytes = self.max_size_bytes,
            "Cache over size limit, evicting oldest entries"
        );

        // Unreadable entries cannot be aged and are left alone.
        entries.retain(|e| e.cached_at.is_some());
        entries.sort_by(|a, b| {
            a.cached_at
                .unwrap_or_default()
                .total_cmp(&b.cached_at.unwrap_or_default())
        });

        let excess = total - self.max_size_bytes;
        let mut freed = 0u64;
        for entry in &entries {
            if freed >= excess {
                break;
            }
            match fs::remove_file(&entry.path) {
                Ok(()) => {
                    freed += entry.size;
                    debug!(path = %entry.path.display(), "Evicted cache entry");
                }
                Err(e) => warn!(path = %entry.path.display(), error = %e, "Failed to evict cache entry"),
            }
        }

        // Expired entries still present once the cap is met go too.
        let expired = entries
            .iter()
            .filter(|e| e.path.exists())
            .filter(|e| e.cached_at.is_some_and(|at| self.is_expired(at, now)))
            .filter(|e| fs::remove_file(&e.path).is_ok())
            .count();
        if expired > 0 {
            debug!(expired, "Removed expired cache entries");
        }
        info!(freed_bytes = freed, "Cache cleanup finished");
    }
}
