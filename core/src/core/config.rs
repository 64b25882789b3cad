//! Engine configuration
//!
//! Plain serde structs with sensible defaults so embedders can construct the
//! engine from a JSON blob, a config file section, or `Default::default()`.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Store Backend Enum
// =============================================================================

/// Store backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendType {
    #[default]
    Memory,
    Redis,
}

impl fmt::Display for StoreBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackendType::Memory => write!(f, "memory"),
            StoreBackendType::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// Config Structs
// =============================================================================

/// Store configuration (used internally by StoreService)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend type
    pub backend: StoreBackendType,
    /// Redis URL (redis backend)
    pub redis_url: Option<String>,
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store configuration
    pub store: StoreConfig,
}
