//! In-memory store implementation using dashmap
//!
//! Default backend for development and tests. Holds plain entries, hashes,
//! and sorted sets in sharded maps; plain entries support TTLs with lazy
//! expiry plus a periodic sweep.

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::backend::StoreBackend;
use super::error::StoreError;

/// Plain entry with optional expiry
struct ValueEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl ValueEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// Sorted set kept as a score index plus an ordered view
///
/// Scores are i64 (timestamp millis in practice), so ordering is total and
/// the member bytes break ties deterministically.
#[derive(Default)]
struct SortedSet {
    scores: HashMap<Vec<u8>, i64>,
    ordered: BTreeSet<(i64, Vec<u8>)>,
}

impl SortedSet {
    fn insert(&mut self, score: i64, member: Vec<u8>) {
        if let Some(old) = self.scores.insert(member.clone(), score) {
            self.ordered.remove(&(old, member.clone()));
        }
        self.ordered.insert((score, member));
    }

    fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(score, member.to_vec()));
                true
            }
            None => false,
        }
    }

    fn range(&self, min: i64, max: i64) -> Vec<Vec<u8>> {
        self.ordered
            .range((Bound::Included((min, Vec::new())), Bound::Unbounded))
            .take_while(|(score, _)| *score <= max)
            .map(|(_, member)| member.clone())
            .collect()
    }
}

/// In-memory store implementation
///
/// Uses:
/// - `DashMap<ValueEntry>` - plain entries with lazy TTL expiry
/// - `DashMap<HashMap>` - hashes; the dashmap entry API makes `hset_nx` and
///   `hincr_by` atomic (exclusive shard access while mutating)
/// - `DashMap<SortedSet>` - sorted sets for event logs and indexes
/// - `sweep_ops` - counts TTL-carrying writes to trigger periodic expiry sweeps
pub struct InMemoryStore {
    entries: DashMap<String, ValueEntry>,
    hashes: DashMap<String, HashMap<String, Vec<u8>>>,
    zsets: DashMap<String, SortedSet>,
    /// Counter for sweep scheduling (increments on every TTL-carrying write)
    sweep_ops: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            hashes: DashMap::new(),
            zsets: DashMap::new(),
            sweep_ops: AtomicU64::new(0),
        }
    }

    /// Drop expired plain entries (called periodically)
    fn sweep_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }

    /// Sweep runs every 256 TTL-carrying writes regardless of map size.
    /// Lazy expiry alone would leak entries that are never read again.
    fn note_ttl_write(&self) {
        let ops = self.sweep_ops.fetch_add(1, Ordering::Relaxed);
        if ops.is_multiple_of(256) {
            self.sweep_expired();
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(Instant::now()) {
                return Ok(Some(entry.data.clone()));
            }
        }
        // Absent or expired; drop the expired entry if it is still there
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_string(), ValueEntry::new(value, ttl));
        if ttl.is_some() {
            self.note_ttl_write();
        }
        Ok(())
    }

    async fn set_nx(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        // Entry API holds exclusive shard access, so check-and-write is atomic
        let written = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(ValueEntry::new(value, ttl));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ValueEntry::new(value, ttl));
                true
            }
        };
        if written && ttl.is_some() {
            self.note_ttl_write();
        }
        Ok(written)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let value_existed = match self.entries.remove(key) {
            Some((_, entry)) => !entry.is_expired(Instant::now()),
            None => false,
        };
        let hash_existed = self.hashes.remove(key).is_some();
        let zset_existed = self.zsets.remove(key).is_some();
        Ok(value_existed || hash_existed || zset_existed)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        if let Some(entry) = self.entries.get(key)
            && !entry.is_expired(Instant::now())
        {
            return Ok(true);
        }
        Ok(self.hashes.contains_key(key) || self.zsets.contains_key(key))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).cloned()))
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hset_nx(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        match hash.entry(field.to_string()) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(true)
            }
        }
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .is_some_and(|hash| hash.contains_key(field)))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let Some(mut hash) = self.hashes.get_mut(key) else {
            return Ok(false);
        };
        let removed = hash.remove(field).is_some();
        let now_empty = hash.is_empty();
        drop(hash);
        if now_empty {
            // Redis semantics: an empty hash does not exist
            self.hashes.remove_if(key, |_, map| map.is_empty());
        }
        Ok(removed)
    }

    async fn hget_all(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let current = match hash.get(field) {
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| {
                    StoreError::Operation("hash value is not an integer".to_string())
                })?,
            None => 0,
        };
        let next = current.saturating_add(delta);
        hash.insert(field.to_string(), next.to_string().into_bytes());
        Ok(next)
    }

    async fn zadd(&self, key: &str, score: i64, member: Vec<u8>) -> Result<(), StoreError> {
        self.zsets
            .entry(key.to_string())
            .or_default()
            .insert(score, member);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: Vec<u8>) -> Result<bool, StoreError> {
        let Some(mut zset) = self.zsets.get_mut(key) else {
            return Ok(false);
        };
        let removed = zset.remove(&member);
        let now_empty = zset.scores.is_empty();
        drop(zset);
        if now_empty {
            self.zsets.remove_if(key, |_, set| set.scores.is_empty());
        }
        Ok(removed)
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .zsets
            .get(key)
            .map(|zset| zset.range(min, max))
            .unwrap_or_default())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
        // Glob pattern reduced to a prefix match; all engine patterns are
        // of the form "prefix*"
        let prefix = pattern.trim_end_matches('*');
        let mut count = 0u64;

        self.entries.retain(|key, _| {
            if key.starts_with(prefix) {
                count += 1;
                false
            } else {
                true
            }
        });
        self.hashes.retain(|key, _| {
            if key.starts_with(prefix) {
                count += 1;
                false
            } else {
                true
            }
        });
        self.zsets.retain(|key, _| {
            if key.starts_with(prefix) {
                count += 1;
                false
            } else {
                true
            }
        });

        Ok(count)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        // In-memory is always healthy
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = InMemoryStore::new();

        store.set("key1", b"value1".to_vec(), None).await.unwrap();
        let result = store.get("key1").await.unwrap();
        assert_eq!(result, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = InMemoryStore::new();

        let result = store.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_set_nx_first_write_wins() {
        let store = InMemoryStore::new();

        assert!(store.set_nx("lease", b"a".to_vec(), None).await.unwrap());
        assert!(!store.set_nx("lease", b"b".to_vec(), None).await.unwrap());

        let result = store.get("lease").await.unwrap();
        assert_eq!(result, Some(b"a".to_vec()));
    }

    #[tokio::test]
    async fn test_set_nx_expired_entry_is_replaceable() {
        let store = InMemoryStore::new();

        assert!(
            store
                .set_nx("lease", b"a".to_vec(), Some(Duration::from_millis(1)))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(
            store
                .set_nx("lease", b"b".to_vec(), Some(Duration::from_secs(60)))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let store = InMemoryStore::new();

        store
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(store.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let result = store.get("key1").await.unwrap();
        assert_eq!(result, None);
        assert!(!store.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();

        store.set("key1", b"value1".to_vec(), None).await.unwrap();
        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert_eq!(store.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_covers_hashes_and_zsets() {
        let store = InMemoryStore::new();

        store.hset("h", "f", b"v".to_vec()).await.unwrap();
        store.zadd("z", 1, b"m".to_vec()).await.unwrap();

        assert!(store.delete("h").await.unwrap());
        assert!(store.delete("z").await.unwrap());
        assert!(!store.exists("h").await.unwrap());
        assert!(!store.exists("z").await.unwrap());
    }

    #[tokio::test]
    async fn test_hset_hget_roundtrip() {
        let store = InMemoryStore::new();

        store.hset("hash", "field", b"value".to_vec()).await.unwrap();
        assert_eq!(
            store.hget("hash", "field").await.unwrap(),
            Some(b"value".to_vec())
        );
        assert_eq!(store.hget("hash", "other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_hset_nx_is_idempotent() {
        let store = InMemoryStore::new();

        assert!(store.hset_nx("hash", "f", b"first".to_vec()).await.unwrap());
        assert!(
            !store
                .hset_nx("hash", "f", b"second".to_vec())
                .await
                .unwrap()
        );
        assert_eq!(
            store.hget("hash", "f").await.unwrap(),
            Some(b"first".to_vec())
        );
    }

    #[tokio::test]
    async fn test_hexists() {
        let store = InMemoryStore::new();

        assert!(!store.hexists("hash", "f").await.unwrap());
        store.hset("hash", "f", b"v".to_vec()).await.unwrap();
        assert!(store.hexists("hash", "f").await.unwrap());
    }

    #[tokio::test]
    async fn test_hdel_removes_empty_hash() {
        let store = InMemoryStore::new();

        store.hset("hash", "f", b"v".to_vec()).await.unwrap();
        assert!(store.hdel("hash", "f").await.unwrap());
        assert!(!store.hdel("hash", "f").await.unwrap());
        assert!(!store.exists("hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_hget_all() {
        let store = InMemoryStore::new();

        store.hset("hash", "a", b"1".to_vec()).await.unwrap();
        store.hset("hash", "b", b"2".to_vec()).await.unwrap();

        let mut all = store.hget_all("hash").await.unwrap();
        all.sort();
        assert_eq!(
            all,
            vec![
                ("a".to_string(), b"1".to_vec()),
                ("b".to_string(), b"2".to_vec())
            ]
        );
    }

    #[tokio::test]
    async fn test_hincr_by_accumulates() {
        let store = InMemoryStore::new();

        assert_eq!(store.hincr_by("counters", "n", 1).await.unwrap(), 1);
        assert_eq!(store.hincr_by("counters", "n", 1).await.unwrap(), 2);
        assert_eq!(store.hincr_by("counters", "n", 3).await.unwrap(), 5);
        assert_eq!(
            store.hget("counters", "n").await.unwrap(),
            Some(b"5".to_vec())
        );
    }

    #[tokio::test]
    async fn test_hincr_by_rejects_non_integer() {
        let store = InMemoryStore::new();

        store.hset("hash", "f", b"not a number".to_vec()).await.unwrap();
        let err = store.hincr_by("hash", "f", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Operation(_)));
    }

    #[tokio::test]
    async fn test_zadd_zrange_ordering() {
        let store = InMemoryStore::new();

        store.zadd("z", 30, b"c".to_vec()).await.unwrap();
        store.zadd("z", 10, b"a".to_vec()).await.unwrap();
        store.zadd("z", 20, b"b".to_vec()).await.unwrap();

        let members = store.zrange_by_score("z", i64::MIN, i64::MAX).await.unwrap();
        assert_eq!(members, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let windowed = store.zrange_by_score("z", 15, 30).await.unwrap();
        assert_eq!(windowed, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[tokio::test]
    async fn test_zadd_updates_score_of_existing_member() {
        let store = InMemoryStore::new();

        store.zadd("z", 10, b"a".to_vec()).await.unwrap();
        store.zadd("z", 99, b"a".to_vec()).await.unwrap();

        let members = store.zrange_by_score("z", i64::MIN, i64::MAX).await.unwrap();
        assert_eq!(members, vec![b"a".to_vec()]);
        let windowed = store.zrange_by_score("z", 50, 100).await.unwrap();
        assert_eq!(windowed, vec![b"a".to_vec()]);
    }

    #[tokio::test]
    async fn test_zrem() {
        let store = InMemoryStore::new();

        store.zadd("z", 1, b"a".to_vec()).await.unwrap();
        assert!(store.zrem("z", b"a".to_vec()).await.unwrap());
        assert!(!store.zrem("z", b"a".to_vec()).await.unwrap());
        assert!(!store.exists("z").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let store = InMemoryStore::new();

        store.set("partner:1:a", b"a".to_vec(), None).await.unwrap();
        store.hset("partner:1:b", "f", b"b".to_vec()).await.unwrap();
        store.zadd("partner:1:c", 1, b"c".to_vec()).await.unwrap();
        store.set("partner:2:a", b"d".to_vec(), None).await.unwrap();

        let deleted = store.delete_pattern("partner:1:*").await.unwrap();
        assert_eq!(deleted, 3);

        assert!(!store.exists("partner:1:a").await.unwrap());
        assert!(!store.exists("partner:1:b").await.unwrap());
        assert!(!store.exists("partner:1:c").await.unwrap());
        assert!(store.exists("partner:2:a").await.unwrap());
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = InMemoryStore::new();
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_backend_name() {
        let store = InMemoryStore::new();
        assert_eq!(store.backend_name(), "memory");
    }
}
