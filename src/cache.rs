//! Content-addressed memoization for the outbound gratka calls.
//!
//! Keys are SHA-256 digests of a namespace plus the canonical JSON form of
//! the call arguments. `serde_json` objects keep their keys sorted, so the
//! digest does not depend on insertion order and stays the same across runs.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_value<T: Serialize + ?Sized>(namespace: &str, value: &T) -> anyhow::Result<Self> {
        // Going through `Value` sorts object keys.
        let canonical = serde_json::to_value(value).context("failed to canonicalize cache key")?;
        let bytes = serde_json::to_vec(&canonical)?;
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(&bytes);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait Cache: Send + Sync {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<String>>;
    fn put(&self, key: &CacheKey, value: &str) -> anyhow::Result<()>;
}

/// Returns the cached value for `key`, or runs `call` and stores its result.
/// Failed calls are not cached.
pub async fn cached_call<C, F, Fut>(cache: &C, key: CacheKey, call: F) -> anyhow::Result<String>
where
    C: Cache + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
{
    if let Some(hit) = cache.get(&key)? {
        debug!("Cache hit for {}", key.as_str());
        return Ok(hit);
    }
    let value = call().await?;
    cache.put(&key, &value)?;
    Ok(value)
}

const MEMORY_CACHE_CAPACITY: u64 = 10_000;

/// Process-local cache; entries live until the process exits or capacity
/// pushes them out.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: moka::sync::Cache<CacheKey, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(MEMORY_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        debug_assert!(max_capacity > 0);
        let entries = moka::sync::Cache::builder()
            .max_capacity(max_capacity)
            .build();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        // moka counts lazily; flush pending writes first.
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key))
    }

    fn put(&self, key: &CacheKey, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.clone(), value.to_string());
        Ok(())
    }
}

/// One file per key inside `dir`. Writes land in a temp file first and are
/// renamed into place, so readers never see a half-written entry.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn put(&self, key: &CacheKey, value: &str) -> anyhow::Result<()> {
        let path = self.entry_path(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn key_is_stable_hex() {
        let a = CacheKey::for_value("page", "http://www.gratka.pl/").unwrap();
        let b = CacheKey::for_value("page", "http://www.gratka.pl/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_depends_on_namespace() {
        let a = CacheKey::for_value("page", "x").unwrap();
        let b = CacheKey::for_value("mapper", "x").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_ignores_map_order() {
        let a = serde_json::json!({"city": "krakow", "rooms": ["2", "3"]});
        let mut c = HashMap::new();
        c.insert("rooms", serde_json::json!(["2", "3"]));
        c.insert("city", serde_json::json!("krakow"));
        assert_eq!(
            CacheKey::for_value("mapper", &a).unwrap(),
            CacheKey::for_value("mapper", &c).unwrap()
        );
    }

    #[tokio::test]
    async fn cached_call_runs_once() {
        let cache = MemoryCache::new();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::for_value("test", "k").unwrap();
        for _ in 0..3 {
            let value = cached_call(&cache, key.clone(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("value".to_string())
            })
            .await
            .unwrap();
            assert_eq!(value, "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_calls_are_not_cached() {
        let cache = MemoryCache::new();
        let key = CacheKey::for_value("test", "k").unwrap();
        let result = cached_call(&cache, key.clone(), || async {
            Err::<String, _>(anyhow::anyhow!("boom"))
        })
        .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_cache_overwrites_and_clones_share_entries() {
        let cache = MemoryCache::new();
        let key = CacheKey::for_value("page", "http://www.gratka.pl/").unwrap();
        assert_eq!(cache.get(&key).unwrap(), None);
        cache.put(&key, "pierwsza").unwrap();
        cache.put(&key, "druga").unwrap();

        let shared = cache.clone();
        assert_eq!(shared.get(&key).unwrap().as_deref(), Some("druga"));
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn disk_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::open(dir.path().join("nested")).unwrap();
        let key = CacheKey::for_value("page", "http://www.gratka.pl/").unwrap();
        assert_eq!(cache.get(&key).unwrap(), None);
        cache.put(&key, "<html>pierwsza</html>").unwrap();
        cache.put(&key, "<html>druga</html>").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("<html>druga</html>"));

        let reopened = DiskCache::open(cache.dir()).unwrap();
        assert_eq!(reopened.get(&key).unwrap().as_deref(), Some("<html>druga</html>"));
    }
}
