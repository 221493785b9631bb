//! On-disk behavior: entries survive reopening the database file.

use docscout_cache::{CacheKey, CacheStore, EvictScope};
use docscout_common::BackendResult;

fn hit(url: &str) -> BackendResult {
    BackendResult {
        title: "Hitachi ZX200 parts catalog".to_string(),
        url: url.to_string(),
        snippet: "illustrated parts breakdown".to_string(),
        source: "serper".to_string(),
        language: "en".to_string(),
    }
}

#[test]
fn entries_survive_reopen_and_keep_merging() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    let key = CacheKey::new("serper", "\"hitachi\" \"parts\"").language("en").page(1);

    {
        let store = CacheStore::open(&db, 30).unwrap();
        store.put(&key, &[hit("https://a.com/zx200.pdf")]).unwrap();
    }

    let store = CacheStore::open(&db, 30).unwrap();
    let cached = store.get(&key).unwrap().expect("entry persisted");
    assert_eq!(cached.len(), 1);

    // Merge after reopen keeps accumulating, not replacing.
    let outcome = store
        .put(&key, &[hit("https://a.com/zx200.pdf"), hit("https://b.com/zx210.pdf")])
        .unwrap();
    assert!(!outcome.was_new);
    assert_eq!(outcome.total, 2);

    assert_eq!(store.evict(EvictScope::All).unwrap(), 1);
    assert!(store.get(&key).unwrap().is_none());
}
