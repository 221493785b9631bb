//! SQLite-backed cache store.
//!
//! Thread-safe via an internal `Mutex<Connection>`. Writes are serialized;
//! the table is small and every statement is indexed, so the critical
//! section stays short. Entries are only mutated by merge-on-write: `put`
//! unions new URLs into the existing result set and refreshes the entry's
//! timestamps, never replacing it wholesale.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use docscout_common::BackendResult;

use crate::error::CacheError;
use crate::key::CacheKey;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS search_cache (
    cache_key    TEXT PRIMARY KEY,
    backend      TEXT NOT NULL,
    query_text   TEXT NOT NULL,
    language     TEXT,
    category     TEXT,
    page         INTEGER,
    results      TEXT NOT NULL,
    result_count INTEGER NOT NULL,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL,
    expires_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_search_cache_backend ON search_cache(backend);
CREATE INDEX IF NOT EXISTS idx_search_cache_expires ON search_cache(expires_at);
";

/// Eviction scope for [`CacheStore::evict`].
#[derive(Debug, Clone)]
pub enum EvictScope {
    /// Every entry.
    All,
    /// Entries written by one backend.
    Backend(String),
    /// Only entries past their expiry.
    Expired,
}

/// Outcome of a merge-on-write `put`.
#[derive(Debug, Clone, Copy)]
pub struct MergeOutcome {
    pub was_new: bool,
    /// URLs that were genuinely new to the entry.
    pub added: usize,
    /// Result count after the write.
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total: u64,
    pub expired: u64,
    pub active: u64,
    /// (backend, entry count, summed result_count) for live entries.
    pub by_backend: Vec<(String, u64, u64)>,
}

pub struct CacheStore {
    conn: Mutex<Connection>,
    ttl_secs: i64,
}

impl CacheStore {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: impl AsRef<Path>, ttl_days: i64) -> Result<Self, CacheError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl_secs: ttl_days * 86_400,
        })
    }

    /// In-memory store, used by tests and cache-disabled setups.
    pub fn in_memory(ttl_days: i64) -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl_secs: ttl_days * 86_400,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Fetch the cached results for `key`, or `None` if no entry exists or
    /// the entry is past its expiry (expired rows are ignored lazily, not
    /// deleted here).
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<BackendResult>>, CacheError> {
        let now = Utc::now().timestamp();
        let conn = self.lock()?;
        let blob: Option<String> = conn
            .query_row(
                "SELECT results FROM search_cache WHERE cache_key = ?1 AND expires_at > ?2",
                params![key.digest(), now],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Insert or merge `results` under `key`.
    ///
    /// Fresh entries get the full TTL window from now. Existing entries are
    /// merged: URLs already present (compared lowercase) are skipped, novel
    /// ones appended, and `updated_at`/`expires_at` refreshed.
    pub fn put(&self, key: &CacheKey, results: &[BackendResult]) -> Result<MergeOutcome, CacheError> {
        let now = Utc::now().timestamp();
        let expires_at = now + self.ttl_secs;
        let digest = key.digest();

        let conn = self.lock()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT results FROM search_cache WHERE cache_key = ?1",
                params![digest],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(raw) = existing {
            let mut merged: Vec<BackendResult> = serde_json::from_str(&raw)?;
            let mut seen: HashSet<String> =
                merged.iter().map(|r| r.url.to_lowercase()).collect();

            let mut added = 0usize;
            for r in results {
                let url = r.url.to_lowercase();
                if !url.is_empty() && !seen.contains(&url) {
                    seen.insert(url);
                    merged.push(r.clone());
                    added += 1;
                }
            }

            conn.execute(
                "UPDATE search_cache SET results = ?1, result_count = ?2, \
                 updated_at = ?3, expires_at = ?4 WHERE cache_key = ?5",
                params![
                    serde_json::to_string(&merged)?,
                    merged.len() as i64,
                    now,
                    expires_at,
                    digest
                ],
            )?;

            if added > 0 {
                debug!(backend = %key.backend, added, total = merged.len(), "cache merge");
            }

            Ok(MergeOutcome {
                was_new: false,
                added,
                total: merged.len(),
            })
        } else {
            conn.execute(
                "INSERT INTO search_cache \
                 (cache_key, backend, query_text, language, category, page, \
                  results, result_count, created_at, updated_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    digest,
                    key.backend,
                    key.query,
                    key.language,
                    key.category,
                    key.page,
                    serde_json::to_string(results)?,
                    results.len() as i64,
                    now,
                    now,
                    expires_at
                ],
            )?;

            debug!(backend = %key.backend, count = results.len(), "cache insert");

            Ok(MergeOutcome {
                was_new: true,
                added: results.len(),
                total: results.len(),
            })
        }
    }

    /// Delete entries in the given scope; returns the number of rows removed.
    /// Evicting an empty store returns 0.
    pub fn evict(&self, scope: EvictScope) -> Result<usize, CacheError> {
        let conn = self.lock()?;
        let removed = match scope {
            EvictScope::All => conn.execute("DELETE FROM search_cache", [])?,
            EvictScope::Backend(ref backend) => conn.execute(
                "DELETE FROM search_cache WHERE backend = ?1",
                params![backend],
            )?,
            EvictScope::Expired => conn.execute(
                "DELETE FROM search_cache WHERE expires_at < ?1",
                params![Utc::now().timestamp()],
            )?,
        };
        Ok(removed)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Utc::now().timestamp();
        let conn = self.lock()?;

        let total: u64 =
            conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0))?;
        let expired: u64 = conn.query_row(
            "SELECT COUNT(*) FROM search_cache WHERE expires_at < ?1",
            params![now],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT backend, COUNT(*), SUM(result_count) FROM search_cache \
             WHERE expires_at > ?1 GROUP BY backend",
        )?;
        let rows = stmt.query_map(params![now], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, Option<u64>>(2)?.unwrap_or(0),
            ))
        })?;

        let mut by_backend = Vec::new();
        for r in rows {
            by_backend.push(r?);
        }

        Ok(CacheStats {
            total,
            expired,
            active: total - expired,
            by_backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> BackendResult {
        BackendResult {
            title: format!("doc at {}", url),
            url: url.to_string(),
            snippet: String::new(),
            source: "brave".to_string(),
            language: "en".to_string(),
        }
    }

    fn key() -> CacheKey {
        CacheKey::new("brave", "\"hitachi\" \"parts\"")
            .language("en")
            .category("parts_catalog")
            .page(1)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = CacheStore::in_memory(30).unwrap();
        assert!(store.get(&key()).unwrap().is_none());
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let store = CacheStore::in_memory(30).unwrap();
        let outcome = store.put(&key(), &[hit("https://a.com/m.pdf")]).unwrap();
        assert!(outcome.was_new);
        assert_eq!(outcome.total, 1);

        let cached = store.get(&key()).unwrap().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].url, "https://a.com/m.pdf");
    }

    #[test]
    fn test_merge_accumulates_superset() {
        // {a,b} then {b,c} must leave exactly {a,b,c}.
        let store = CacheStore::in_memory(30).unwrap();
        store
            .put(&key(), &[hit("https://x.com/a.pdf"), hit("https://x.com/b.pdf")])
            .unwrap();
        let outcome = store
            .put(&key(), &[hit("https://x.com/b.pdf"), hit("https://x.com/c.pdf")])
            .unwrap();

        assert!(!outcome.was_new);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.total, 3);

        let urls: Vec<String> = store
            .get(&key())
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(
            urls,
            vec!["https://x.com/a.pdf", "https://x.com/b.pdf", "https://x.com/c.pdf"]
        );
    }

    #[test]
    fn test_merge_url_compare_is_case_insensitive() {
        let store = CacheStore::in_memory(30).unwrap();
        store.put(&key(), &[hit("https://X.com/A.pdf")]).unwrap();
        let outcome = store.put(&key(), &[hit("https://x.com/a.pdf")]).unwrap();
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.total, 1);
    }

    #[test]
    fn test_expired_entry_not_served() {
        // Zero-day TTL expires immediately relative to the lookup's `>` check.
        let store = CacheStore::in_memory(0).unwrap();
        store.put(&key(), &[hit("https://a.com/m.pdf")]).unwrap();
        assert!(store.get(&key()).unwrap().is_none());
    }

    #[test]
    fn test_evict_empty_store_is_zero() {
        let store = CacheStore::in_memory(30).unwrap();
        assert_eq!(store.evict(EvictScope::All).unwrap(), 0);
        assert_eq!(store.evict(EvictScope::Expired).unwrap(), 0);
        assert_eq!(
            store.evict(EvictScope::Backend("brave".into())).unwrap(),
            0
        );
    }

    #[test]
    fn test_evict_per_backend() {
        let store = CacheStore::in_memory(30).unwrap();
        store.put(&CacheKey::new("brave", "q"), &[hit("https://a.com/1.pdf")]).unwrap();
        store.put(&CacheKey::new("serper", "q"), &[hit("https://a.com/2.pdf")]).unwrap();

        assert_eq!(store.evict(EvictScope::Backend("brave".into())).unwrap(), 1);
        assert!(store.get(&CacheKey::new("brave", "q")).unwrap().is_none());
        assert!(store.get(&CacheKey::new("serper", "q")).unwrap().is_some());
    }

    #[test]
    fn test_stats_counts_live_entries() {
        let store = CacheStore::in_memory(30).unwrap();
        store.put(&CacheKey::new("brave", "q1"), &[hit("https://a.com/1.pdf")]).unwrap();
        store
            .put(
                &CacheKey::new("brave", "q2"),
                &[hit("https://a.com/2.pdf"), hit("https://a.com/3.pdf")],
            )
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.by_backend, vec![("brave".to_string(), 2, 3)]);
    }
}
