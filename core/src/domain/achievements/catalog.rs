//! Achievement catalog
//!
//! Definitions the tracker awards against. Defaults are embedded at compile
//! time; deployments can replace or extend them through a remote-config
//! document in the store, applied at boot or on explicit refresh rather than
//! looked up per call.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::records::AchievementDefinition;
use crate::domain::types::AchievementCategory;
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Embedded default definitions (compile-time)
const EMBEDDED_CATALOG_JSON: &str = include_str!("../../../data/achievement_catalog.json");

// ============================================================================
// CATALOG DATA
// ============================================================================

/// On-disk / remote-config document shape
#[derive(serde::Deserialize)]
struct CatalogDocument {
    achievements: Vec<serde_json::Value>,
}

/// Parsed and indexed definitions
#[derive(Debug, Default)]
struct CatalogData {
    by_id: HashMap<String, AchievementDefinition>,
}

impl CatalogData {
    /// Parse a catalog document, skipping invalid entries
    ///
    /// Entries are validated one by one so a single malformed definition
    /// cannot take down the rest of the document.
    fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let document: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("Invalid achievement catalog: {e}")))?;

        let mut by_id = HashMap::new();
        for entry in document.achievements {
            match serde_json::from_value::<AchievementDefinition>(entry) {
                Ok(def) if def.id.is_empty() => {
                    tracing::warn!("Skipping achievement definition with empty id");
                }
                Ok(def) => {
                    if by_id.insert(def.id.clone(), def).is_some() {
                        tracing::warn!("Duplicate achievement id in catalog, keeping last");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid achievement definition");
                }
            }
        }
        Ok(Self { by_id })
    }
}

// ============================================================================
// CATALOG SERVICE
// ============================================================================

/// Achievement catalog with refreshable definitions
///
/// Read-heavy: queried on every award and eligibility check, written only by
/// `refresh_from_store`.
pub struct AchievementCatalog {
    data: RwLock<CatalogData>,
}

impl AchievementCatalog {
    /// Build the catalog from the embedded defaults
    pub fn load_embedded() -> Result<Self, EngineError> {
        let data = CatalogData::from_json_str(EMBEDDED_CATALOG_JSON)?;
        tracing::debug!(definitions = data.by_id.len(), "Achievement catalog loaded");
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Merge override definitions from the store's remote-config key
    ///
    /// Same-id entries replace defaults, new ids are added. Returns how many
    /// definitions were merged. An absent or unparseable override document
    /// leaves the current catalog standing (store transport errors still
    /// propagate).
    pub async fn refresh_from_store(&self, store: &StoreService) -> Result<usize, EngineError> {
        let raw = match store.get_raw(&StoreKey::catalog_override()).await? {
            Some(bytes) => bytes,
            None => return Ok(0),
        };

        let json = match std::str::from_utf8(&raw) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Achievement catalog override is not UTF-8, keeping current catalog");
                return Ok(0);
            }
        };
        let overrides = match CatalogData::from_json_str(json) {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse achievement catalog override, keeping current catalog");
                return Ok(0);
            }
        };

        let merged = overrides.by_id.len();
        if merged > 0 {
            let mut data = self.data.write();
            for (id, def) in overrides.by_id {
                data.by_id.insert(id, def);
            }
        }
        tracing::debug!(merged, "Achievement catalog refreshed from store");
        Ok(merged)
    }

    /// Look up a definition by id
    pub fn get(&self, achievement_id: &str) -> Option<AchievementDefinition> {
        self.data.read().by_id.get(achievement_id).cloned()
    }

    /// Whether the id is in the catalog
    pub fn contains(&self, achievement_id: &str) -> bool {
        self.data.read().by_id.contains_key(achievement_id)
    }

    /// All definitions, ordered by id
    pub fn all(&self) -> Vec<AchievementDefinition> {
        let data = self.data.read();
        let mut defs: Vec<AchievementDefinition> = data.by_id.values().cloned().collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }

    /// Definitions in one category, ordered by id
    pub fn by_category(&self, category: AchievementCategory) -> Vec<AchievementDefinition> {
        let data = self.data.read();
        let mut defs: Vec<AchievementDefinition> = data
            .by_id
            .values()
            .filter(|def| def.category == category)
            .cloned()
            .collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.data.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().by_id.is_empty()
    }
}
