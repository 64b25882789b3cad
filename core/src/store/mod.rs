//! Store module
//!
//! Authoritative persistence for partner state with pluggable backends:
//! - In-memory (default) - uses dashmap, suited to development and tests
//! - Redis (optional) - uses deadpool-redis
//!
//! All engine services read and write through [`StoreService`], which adds a
//! typed JSON layer over the raw byte operations of the backend.

mod backend;
mod error;
mod key;
mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::StoreBackend;
pub use error::StoreError;
pub use key::StoreKey;
pub use memory::InMemoryStore;

use crate::core::config::{StoreBackendType, StoreConfig};

/// Store service providing typed access to the store backend
///
/// Wraps the underlying backend and provides:
/// - Raw bytes API for flexibility
/// - Typed API using JSON serialization
pub struct StoreService {
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for StoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreService")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl StoreService {
    /// Create a new store service from configuration
    pub async fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let backend: Arc<dyn StoreBackend> = match config.backend {
            StoreBackendType::Memory => {
                tracing::debug!("Initializing in-memory store");
                Arc::new(InMemoryStore::new())
            }
            StoreBackendType::Redis => {
                let url = config.redis_url.as_ref().ok_or_else(|| {
                    StoreError::Config("redis_url required for Redis backend".into())
                })?;
                // Note: RedisStore::new logs sanitized URL internally
                Arc::new(redis::RedisStore::new(url).await?)
            }
        };

        Ok(Self { backend })
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    // =========================================================================
    // Raw bytes API
    // =========================================================================

    /// Get raw bytes
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.backend.get(key).await
    }

    /// Set raw bytes with optional TTL
    pub async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.backend.set(key, value, ttl).await
    }

    /// Atomically set raw bytes only if the key does not exist
    pub async fn set_nx_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<bool, StoreError> {
        self.backend.set_nx(key, value, ttl).await
    }

    // =========================================================================
    // Typed API (serde_json)
    // =========================================================================

    /// Get a typed value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value with optional TTL
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_raw(key, bytes, ttl).await
    }

    /// Get a typed hash field
    pub async fn hget_json<T: DeserializeOwned>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.backend.hget(key, field).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed hash field unconditionally
    pub async fn hset_json<T: Serialize>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.hset(key, field, bytes).await
    }

    /// Atomically set a typed hash field only if it does not exist
    ///
    /// Returns `true` if the field was written.
    pub async fn hset_nx_json<T: Serialize>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<bool, StoreError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.hset_nx(key, field, bytes).await
    }

    /// Get all fields of a hash as typed values
    pub async fn hget_all_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let raw = self.backend.hget_all(key).await?;
        let mut result = Vec::with_capacity(raw.len());
        for (field, bytes) in raw {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            result.push((field, value));
        }
        Ok(result)
    }

    /// Add a typed member to a sorted set
    pub async fn zadd_json<T: Serialize>(
        &self,
        key: &str,
        score: i64,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.zadd(key, score, bytes).await
    }

    /// Get typed members with scores in `[min, max]`, ascending by score
    pub async fn zrange_json<T: DeserializeOwned>(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<T>, StoreError> {
        let raw = self.backend.zrange_by_score(key, min, max).await?;
        let mut result = Vec::with_capacity(raw.len());
        for bytes in raw {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            result.push(value);
        }
        Ok(result)
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Delete a key (any type)
    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.backend.delete(key).await
    }

    /// Check if a key exists
    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.backend.exists(key).await
    }

    /// Check if a hash field exists
    pub async fn hexists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.backend.hexists(key, field).await
    }

    /// Delete a hash field
    pub async fn hdel(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.backend.hdel(key, field).await
    }

    /// List the raw fields and values of a hash
    pub async fn hget_all_raw(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.backend.hget_all(key).await
    }

    /// Atomically increment an integer hash field
    pub async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.backend.hincr_by(key, field, delta).await
    }

    /// Add a raw member to a sorted set
    pub async fn zadd_raw(&self, key: &str, score: i64, member: Vec<u8>) -> Result<(), StoreError> {
        self.backend.zadd(key, score, member).await
    }

    /// Remove a raw member from a sorted set
    pub async fn zrem_raw(&self, key: &str, member: Vec<u8>) -> Result<bool, StoreError> {
        self.backend.zrem(key, member).await
    }

    /// Get raw members with scores in `[min, max]`, ascending by score
    pub async fn zrange_raw(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<Vec<u8>>, StoreError> {
        self.backend.zrange_by_score(key, min, max).await
    }

    /// Delete keys matching a pattern
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
        self.backend.delete_pattern(pattern).await
    }

    /// Health check
    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.backend.health_check().await
    }
}
