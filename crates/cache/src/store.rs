//! Cache store with interchangeable backends.
//!
//! [`CacheStore`] has two variants chosen at construction time: a real store
//! (Redis or disk backend) and a disabled store that always misses on read
//! and discards writes. Both satisfy the same contract so callers never
//! branch on whether caching is turned on.

use parking_lot::Mutex;
use redis::Commands;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use keysweep_core::CacheConfig;

use crate::cipher::SecretCipher;
use crate::entry::CacheEntry;
use crate::errors::{CacheError, Result};
use crate::keys;

/// Snapshot of cache state for the management surface.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: String,
    pub enabled: bool,
    pub ttl_secs: u64,
    pub key_count: usize,
    pub byte_size: u64,
    pub per_type_counts: BTreeMap<String, usize>,
}

/// Namespaced, TTL'd key-value store.
pub enum CacheStore {
    Real(RealCache),
    Disabled,
}

impl CacheStore {
    /// Build a store from configuration. Never fails: a disabled
    /// configuration or an unusable key file yields the disabled variant,
    /// an unreachable Redis falls back to the disk backend.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return CacheStore::Disabled;
        }
        match RealCache::new(config) {
            Ok(cache) => CacheStore::Real(cache),
            Err(e) => {
                warn!(error = %e, "cache initialization failed, disabling cache");
                CacheStore::Disabled
            }
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, CacheStore::Real(_))
    }

    /// Look up a logical key. Expired, corrupt, or undecryptable entries
    /// are deleted and reported as misses; this never returns an error.
    pub fn get(&self, logical: &str) -> Option<String> {
        match self {
            CacheStore::Real(cache) => cache.get(logical),
            CacheStore::Disabled => None,
        }
    }

    /// Store a value, encrypting it first when `sensitive`.
    pub fn set(&self, logical: &str, value: &str, sensitive: bool) -> bool {
        match self {
            CacheStore::Real(cache) => cache.set(logical, value, sensitive),
            CacheStore::Disabled => false,
        }
    }

    pub fn delete(&self, logical: &str) -> bool {
        match self {
            CacheStore::Real(cache) => cache.delete(logical),
            CacheStore::Disabled => false,
        }
    }

    /// Remove every entry under this store's namespace prefix. Entries of
    /// other prefixes sharing the backend are never touched.
    pub fn clear(&self) -> bool {
        match self {
            CacheStore::Real(cache) => cache.purge_logical_prefix(""),
            CacheStore::Disabled => false,
        }
    }

    /// Remove every entry whose logical key starts with `logical_prefix`,
    /// still restricted to this store's namespace.
    pub fn purge_logical_prefix(&self, logical_prefix: &str) -> bool {
        match self {
            CacheStore::Real(cache) => cache.purge_logical_prefix(logical_prefix),
            CacheStore::Disabled => false,
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self {
            CacheStore::Real(cache) => cache.stats(),
            CacheStore::Disabled => CacheStats {
                backend: "disabled".to_string(),
                enabled: false,
                ttl_secs: 0,
                key_count: 0,
                byte_size: 0,
                per_type_counts: BTreeMap::new(),
            },
        }
    }
}

/// The enabled store: namespace prefix, TTL, cipher and a concrete backend.
pub struct RealCache {
    prefix: String,
    ttl_secs: u64,
    cipher: SecretCipher,
    backend: Backend,
}

impl RealCache {
    fn new(config: &CacheConfig) -> Result<Self> {
        let cipher = SecretCipher::load_or_generate(&config.key_file)?;
        let backend = match &config.redis_url {
            Some(url) => match Backend::connect_redis(url) {
                Ok(backend) => backend,
                Err(e) => {
                    warn!(error = %e, "networked cache unreachable, falling back to disk");
                    Backend::disk(&config.dir)?
                }
            },
            None => Backend::disk(&config.dir)?,
        };

        Ok(Self {
            prefix: config.prefix.clone(),
            ttl_secs: config.ttl_secs,
            cipher,
            backend,
        })
    }

    fn get(&self, logical: &str) -> Option<String> {
        let full = keys::namespaced(&self.prefix, logical);
        let raw = match self.backend.read(&full) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(key = %full, error = %e, "cache read failed");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %full, error = %e, "corrupt cache entry, dropping");
                self.remove(&full);
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key = %full, "cache entry expired");
            self.remove(&full);
            return None;
        }

        if entry.encrypted {
            match self.cipher.decrypt(&entry.value) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(key = %full, error = %e, "undecryptable cache entry, dropping");
                    self.remove(&full);
                    None
                }
            }
        } else {
            Some(entry.value)
        }
    }

    fn set(&self, logical: &str, value: &str, sensitive: bool) -> bool {
        let stored = if sensitive {
            match self.cipher.encrypt(value) {
                Ok(blob) => blob,
                Err(e) => {
                    warn!(error = %e, "failed to encrypt cache payload");
                    return false;
                }
            }
        } else {
            value.to_string()
        };

        let entry = CacheEntry::new(stored, sensitive, self.ttl_secs);
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize cache entry");
                return false;
            }
        };

        let full = keys::namespaced(&self.prefix, logical);
        match self.backend.write(&full, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %full, error = %e, "cache write failed");
                false
            }
        }
    }

    fn delete(&self, logical: &str) -> bool {
        self.remove(&keys::namespaced(&self.prefix, logical))
    }

    fn remove(&self, full: &str) -> bool {
        match self.backend.remove(full) {
            Ok(()) => true,
            Err(e) => {
                debug!(key = %full, error = %e, "cache delete failed");
                false
            }
        }
    }

    fn purge_logical_prefix(&self, logical_prefix: &str) -> bool {
        let full_prefix = keys::namespaced(&self.prefix, logical_prefix);
        let keys = match self.backend.list_keys(&self.prefix) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cache key listing failed");
                return false;
            }
        };

        let mut ok = true;
        for key in keys {
            if key.starts_with(&full_prefix) {
                ok &= self.remove(&key);
            }
        }
        ok
    }

    fn stats(&self) -> CacheStats {
        let keys = self.backend.list_keys(&self.prefix).unwrap_or_default();
        let mut per_type_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut byte_size = 0u64;

        for key in &keys {
            if let Some(logical) = keys::strip_prefix(&self.prefix, key) {
                *per_type_counts
                    .entry(keys::kind_of(logical).to_string())
                    .or_default() += 1;
            }
            byte_size += self.backend.size_of(key).unwrap_or(0);
        }

        CacheStats {
            backend: self.backend.name().to_string(),
            enabled: true,
            ttl_secs: self.ttl_secs,
            key_count: keys.len(),
            byte_size,
            per_type_counts,
        }
    }
}

/// Concrete storage backend.
enum Backend {
    Redis {
        conn: Mutex<redis::Connection>,
    },
    Disk {
        dir: PathBuf,
        tmp_counter: AtomicU64,
    },
}

impl Backend {
    fn connect_redis(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_connection()?;
        redis::cmd("PING").query::<String>(&mut conn)?;
        Ok(Backend::Redis {
            conn: Mutex::new(conn),
        })
    }

    fn disk(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Backend::Disk {
            dir: dir.to_path_buf(),
            tmp_counter: AtomicU64::new(0),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Redis { .. } => "redis",
            Backend::Disk { .. } => "disk",
        }
    }

    fn read(&self, full_key: &str) -> Result<Option<String>> {
        match self {
            Backend::Redis { conn } => {
                let mut conn = conn.lock();
                Ok(conn.get(full_key)?)
            }
            Backend::Disk { dir, .. } => {
                let path = dir.join(keys::filename(full_key));
                if !path.exists() {
                    return Ok(None);
                }
                Ok(Some(fs::read_to_string(path)?))
            }
        }
    }

    fn write(&self, full_key: &str, raw: &str) -> Result<()> {
        match self {
            Backend::Redis { conn } => {
                let mut conn = conn.lock();
                conn.set::<_, _, ()>(full_key, raw)?;
                Ok(())
            }
            Backend::Disk { dir, tmp_counter } => {
                let path = dir.join(keys::filename(full_key));
                // Write-then-rename keeps readers from seeing half a record.
                let tmp = dir.join(format!(
                    ".tmp-{}-{}",
                    std::process::id(),
                    tmp_counter.fetch_add(1, Ordering::Relaxed)
                ));
                fs::write(&tmp, raw)?;
                fs::rename(&tmp, &path)?;
                Ok(())
            }
        }
    }

    fn remove(&self, full_key: &str) -> Result<()> {
        match self {
            Backend::Redis { conn } => {
                let mut conn = conn.lock();
                conn.del::<_, ()>(full_key)?;
                Ok(())
            }
            Backend::Disk { dir, .. } => {
                let path = dir.join(keys::filename(full_key));
                if path.exists() {
                    fs::remove_file(path)?;
                }
                Ok(())
            }
        }
    }

    /// Full keys under `prefix`. Redis uses SCAN, never KEYS.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        match self {
            Backend::Redis { conn } => {
                let mut conn = conn.lock();
                let pattern = format!("{prefix}:*");
                let found: Vec<String> = conn.scan_match(&pattern)?.collect();
                Ok(found)
            }
            Backend::Disk { dir, .. } => {
                let mut found = Vec::new();
                for dirent in fs::read_dir(dir)? {
                    let name = dirent?.file_name();
                    let Some(name) = name.to_str() else { continue };
                    let Some(full) = keys::key_from_filename(name) else {
                        continue;
                    };
                    if keys::strip_prefix(prefix, &full).is_some() {
                        found.push(full);
                    }
                }
                Ok(found)
            }
        }
    }

    fn size_of(&self, full_key: &str) -> Result<u64> {
        match self {
            Backend::Redis { conn } => {
                let mut conn = conn.lock();
                Ok(redis::cmd("STRLEN").arg(full_key).query(&mut *conn)?)
            }
            Backend::Disk { dir, .. } => {
                let path = dir.join(keys::filename(full_key));
                Ok(fs::metadata(path).map(|m| m.len()).unwrap_or(0))
            }
        }
    }
}
