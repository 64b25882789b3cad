//! Store backend trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::StoreError;

/// Store backend trait
///
/// Defines the key/value, hash, and sorted-set operations the engine needs.
/// Both the in-memory and Redis backends implement this trait.
///
/// # Consistency Notes
///
/// Individual operations are atomic. `set_nx`, `hset_nx`, and `hincr_by` are
/// the primitives the engine relies on for correctness under concurrency
/// (award idempotency, sequence counters, renewal leases); the boolean return
/// values of `delete`, `hdel`, and `zrem` are best-effort and may be stale in
/// concurrent scenarios.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Set a value with optional TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), StoreError>;

    /// Atomically set a value only if the key does not exist
    ///
    /// Returns `true` if the value was written. Used for renewal leases.
    async fn set_nx(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError>;

    /// Delete a key (any type)
    ///
    /// Returns `true` if the key existed before deletion.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Check if a key exists (any type)
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Get a hash field
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Set a hash field unconditionally
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Atomically set a hash field only if it does not exist
    ///
    /// Returns `true` if the field was written. This is the idempotency
    /// primitive for non-repeatable achievement awards: the conditional write
    /// happens inside the store, so two racing awards cannot both succeed.
    async fn hset_nx(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool, StoreError>;

    /// Check if a hash field exists
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Delete a hash field
    ///
    /// Returns `true` if the field existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Get all fields and values of a hash
    async fn hget_all(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Atomically increment an integer hash field, creating it at zero first
    ///
    /// Returns the new value. Fails if the field holds something that is
    /// not an integer.
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    /// Add a member to a sorted set with the given score
    ///
    /// Re-adding an existing member updates its score.
    async fn zadd(&self, key: &str, score: i64, member: Vec<u8>) -> Result<(), StoreError>;

    /// Remove a member from a sorted set
    ///
    /// Returns `true` if the member existed.
    async fn zrem(&self, key: &str, member: Vec<u8>) -> Result<bool, StoreError>;

    /// Get members with scores in `[min, max]`, ascending by score
    ///
    /// Pass `i64::MIN`/`i64::MAX` for an unbounded range.
    async fn zrange_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<Vec<u8>>, StoreError>;

    /// Delete keys matching a glob pattern (e.g. "v1:partner:p1:*")
    ///
    /// Performance: O(n) scan for the memory backend, SCAN loop for Redis.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, StoreError>;

    /// Health check (validates connection)
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
