use super::*;
use crate::hashing::hash_canonical;
use crate::storage::CacheEntry;

fn key(text: &str) -> CacheKey {
    CacheKey::from_digest(hash_canonical(text))
}

fn create_test_entry(text: &str) -> CacheEntry {
    CacheEntry {
        key: key(text),
        payload: b"[]".to_vec(),
        row_count: 0,
        stored_at: 0,
        ttl_secs: 60,
        source_tier: Tier::Scoped,
    }
}

#[test]
fn test_scoped_insert_and_get() {
    let mut tier = ScopedTier::new();
    assert!(tier.is_empty());

    assert!(tier.insert(create_test_entry("a")));

    assert_eq!(tier.len(), 1);
    assert!(tier.contains(&key("a")));
    assert_eq!(tier.get(&key("a")).map(|e| e.key), Some(key("a")));
    assert!(tier.get(&key("b")).is_none());
}

#[test]
fn test_scoped_default_capacity() {
    let tier = ScopedTier::default();
    assert_eq!(tier.capacity(), crate::constants::DEFAULT_SCOPED_CAPACITY);
}

#[test]
fn test_scoped_rejects_new_keys_when_full() {
    let mut tier = ScopedTier::with_capacity(2);

    assert!(tier.insert(create_test_entry("a")));
    assert!(tier.insert(create_test_entry("b")));
    assert!(tier.is_full());

    assert!(!tier.insert(create_test_entry("c")));

    assert_eq!(tier.len(), 2);
    assert!(tier.contains(&key("a")));
    assert!(tier.contains(&key("b")));
    assert!(!tier.contains(&key("c")));
}

#[test]
fn test_scoped_overwrite_allowed_when_full() {
    let mut tier = ScopedTier::with_capacity(1);
    assert!(tier.insert(create_test_entry("a")));

    let mut replacement = create_test_entry("a");
    replacement.payload = b"[1]".to_vec();
    replacement.row_count = 1;

    assert!(tier.insert(replacement));
    assert_eq!(tier.get(&key("a")).map(|e| e.row_count), Some(1));
}

#[test]
fn test_scoped_zero_capacity_stores_nothing() {
    let mut tier = ScopedTier::with_capacity(0);
    assert!(!tier.insert(create_test_entry("a")));
    assert!(tier.is_empty());
}

#[test]
fn test_scoped_remove_frees_slot() {
    let mut tier = ScopedTier::with_capacity(1);
    tier.insert(create_test_entry("a"));

    assert!(tier.remove(&key("a")).is_some());
    assert!(tier.remove(&key("a")).is_none());
    assert!(tier.insert(create_test_entry("b")));
}

#[test]
fn test_scoped_clear() {
    let mut tier = ScopedTier::new();
    for text in ["a", "b", "c"] {
        tier.insert(create_test_entry(text));
    }
    assert_eq!(tier.keys().count(), 3);

    tier.clear();
    assert!(tier.is_empty());
}

#[test]
fn test_scoped_debug_shows_counts() {
    let mut tier = ScopedTier::with_capacity(5);
    tier.insert(create_test_entry("a"));

    let rendered = format!("{:?}", tier);
    assert!(rendered.contains("entries: 1"));
    assert!(rendered.contains("capacity: 5"));
}

#[test]
fn test_cache_key_storage_key_format() {
    let k = key("SELECT Id FROM Account");
    let storage_key = k.storage_key();

    assert!(storage_key.starts_with("canon:v1:"));
    assert_eq!(storage_key.len(), "canon:v1:".len() + 64);
    assert_eq!(k.to_string(), k.to_hex());
}

#[test]
fn test_storage_mode_parsing() {
    assert_eq!("both".parse::<StorageMode>(), Ok(StorageMode::Both));
    assert_eq!("Scoped".parse::<StorageMode>(), Ok(StorageMode::ScopedOnly));
    assert_eq!(
        " shared_only ".parse::<StorageMode>(),
        Ok(StorageMode::SharedOnly)
    );
    assert!("everywhere".parse::<StorageMode>().is_err());

    assert!(StorageMode::Both.includes_scoped() && StorageMode::Both.includes_shared());
    assert!(!StorageMode::ScopedOnly.includes_shared());
    assert!(!StorageMode::SharedOnly.includes_scoped());
}

#[test]
fn test_cache_options_from_json() {
    let options: CacheOptions = serde_json::from_str(
        r#"{"storageMode":"sharedOnly","ttlSeconds":120,"maxResults":50,"enforceAccessControl":true}"#,
    )
    .unwrap();

    assert_eq!(options.storage_mode, StorageMode::SharedOnly);
    assert_eq!(options.ttl_secs, 120);
    assert_eq!(options.max_results.map(|n| n.get()), Some(50));
    assert!(options.enforce_access_control);
    assert!(!options.bypass);
}

#[test]
fn test_cache_options_json_defaults() {
    let options: CacheOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, CacheOptions::default());
    assert_eq!(options.ttl_secs, crate::constants::DEFAULT_TTL_SECS);
}

#[test]
fn test_cache_options_rejects_zero_max_results() {
    let result: Result<CacheOptions, _> = serde_json::from_str(r#"{"maxResults":0}"#);
    assert!(result.is_err());
}

#[test]
fn test_cache_options_apply_cap() {
    let mut rows = vec![1, 2, 3, 4];
    CacheOptions::default().apply_cap(&mut rows);
    assert_eq!(rows.len(), 4);

    CacheOptions::default()
        .with_max_results(2)
        .apply_cap(&mut rows);
    assert_eq!(rows, vec![1, 2]);

    assert!(CacheOptions::default().with_max_results(0).max_results.is_none());
}

#[test]
fn test_cache_status_values() {
    assert_eq!(CacheStatus::HitScoped.as_str(), "HIT_SCOPED");
    assert_eq!(CacheStatus::Bypass.to_string(), "BYPASS");
    assert!(CacheStatus::HitShared.is_hit());
    assert!(!CacheStatus::Bypass.is_hit());
    assert_eq!(CacheStatus::HitShared.tier(), Some(Tier::Shared));
    assert_eq!(CacheStatus::Miss.tier(), None);
}
