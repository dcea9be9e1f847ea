//! File-per-query result store.

use crate::error::{CacheError, Result};
use crate::key::cache_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use trawl_core::{Hit, Query};

/// One cached scan result, stored as `<key>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key of `query`
    pub key: String,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
    /// The normalized query
    pub query: Query,
    /// Merged scan results
    pub hits: Vec<Hit>,
}

/// Content-addressed cache of scan results.
///
/// Entries are whole files replaced by rename, so a reader sees either the
/// old or the new entry. Concurrent writers of the same key: last one wins.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Cache rooted at `dir`. The directory is created on first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for a query.
    #[must_use]
    pub fn path_for(&self, query: &Query) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(query)))
    }

    /// Cached hits for a query.
    ///
    /// Missing, unreadable, corrupt or mismatched entries are misses.
    pub async fn load(&self, query: &Query) -> Option<Vec<Hit>> {
        let path = self.path_for(query);
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry");
                return None;
            }
        };

        let expected = cache_key(query);
        if entry.key != expected {
            tracing::warn!(path = %path.display(), found = %entry.key, "cache entry key mismatch");
            return None;
        }

        tracing::debug!(key = %expected, count = entry.hits.len(), "cache hit");
        Some(entry.hits)
    }

    /// Store hits for a query, replacing any previous entry.
    ///
    /// An empty hit list is not stored and returns the entry path unchanged.
    pub async fn store(&self, query: &Query, hits: &[Hit]) -> Result<PathBuf> {
        let path = self.path_for(query);
        if hits.is_empty() {
            tracing::debug!(path = %path.display(), "not caching empty result");
            return Ok(path);
        }

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io(&self.dir, e))?;

        let entry = CacheEntry {
            key: cache_key(query),
            stored_at: Utc::now(),
            query: query.normalized(),
            hits: hits.to_vec(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        let tmp = self
            .dir
            .join(format!("{}.json.{}.tmp", entry.key, uuid::Uuid::new_v4()));
        fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CacheError::io(&path, e));
        }

        tracing::debug!(key = %entry.key, count = hits.len(), "cached scan result");
        Ok(path)
    }

    /// Remove the entry for a query. Returns whether one existed.
    pub async fn clear(&self, query: &Query) -> Result<bool> {
        let path = self.path_for(query);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "cleared cache entry");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hits() -> Vec<Hit> {
        vec![
            Hit::new("Radaris", "probe: https://radaris.com/p/jdoe", "jdoe", "https://radaris.com/p/jdoe")
                .with_flag("probed", true),
            Hit::new("Zillow", "Zillow (open site)", "no probe", "https://www.zillow.com")
                .with_flag("fallback", "home"),
        ]
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path().join("results"));
        let query = Query::new().with_username("JDoe");

        let path = cache.store(&query, &hits()).await.expect("store");
        assert!(path.exists());
        assert_eq!(path, cache.path_for(&query));

        let loaded = cache
            .load(&Query::new().with_username(" jdoe "))
            .await
            .expect("cache hit");
        assert_eq!(loaded, hits());
    }

    #[tokio::test]
    async fn test_empty_result_not_stored() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path());
        let query = Query::new().with_username("nobody");

        let path = cache.store(&query, &[]).await.expect("store");
        assert!(!path.exists());
        assert!(cache.load(&query).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path());
        let query = Query::new().with_email("a@b.com");

        std::fs::write(cache.path_for(&query), "{not json").expect("write garbage");
        assert!(cache.load(&query).await.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_key_is_miss() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path());
        let a = Query::new().with_username("a");
        let b = Query::new().with_username("b");

        let path_a = cache.store(&a, &hits()).await.expect("store a");
        std::fs::copy(&path_a, cache.path_for(&b)).expect("copy entry");
        assert!(cache.load(&b).await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path());
        let query = Query::new().with_username("jdoe");

        assert!(!cache.clear(&query).await.expect("clear missing"));
        cache.store(&query, &hits()).await.expect("store");
        assert!(cache.clear(&query).await.expect("clear"));
        assert!(cache.load(&query).await.is_none());
    }

    #[tokio::test]
    async fn test_store_overwrites_and_leaves_no_temp_files() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = ResultCache::new(tmp.path());
        let query = Query::new().with_username("jdoe");

        cache.store(&query, &hits()).await.expect("first store");
        let newer = vec![Hit::new("PeekYou", "t", "jdoe", "https://www.peekyou.com/jdoe")];
        cache.store(&query, &newer).await.expect("second store");

        assert_eq!(cache.load(&query).await, Some(newer));
        let leftovers = std::fs::read_dir(tmp.path())
            .expect("read dir")
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
