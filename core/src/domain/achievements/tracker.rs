//! Achievement tracker
//!
//! Awards achievements against the catalog and answers earned/progress
//! queries. Award writes are store-atomic: non-repeatable awards use a
//! conditional hash write (`hset_nx`) so two racing awards cannot both win,
//! and repeatable awards take their instance number from an atomic counter.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::AchievementCatalog;
use crate::domain::records::{AchievementDefinition, AwardedAchievement};
use crate::domain::types::AchievementCategory;
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

/// One earned achievement instance with its definition joined in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarnedAchievement {
    pub definition: AchievementDefinition,
    pub completed_at: DateTime<Utc>,
}

/// Per-definition completion state within a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgress {
    pub achievement_id: String,
    pub completed: bool,
    /// Timestamp of the first award, when completed
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completion summary for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProgress {
    /// Definitions in the category
    pub total: u32,
    /// Definitions with at least one award
    pub completed: u32,
    /// `completed / total`, rounded to the nearest integer percent
    pub percentage: u32,
    pub achievements: Vec<AchievementProgress>,
}

/// Achievement tracker backed by the store
pub struct AchievementTracker {
    store: Arc<StoreService>,
    catalog: Arc<AchievementCatalog>,
}

impl AchievementTracker {
    pub fn new(store: Arc<StoreService>, catalog: Arc<AchievementCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Award an achievement to a partner
    ///
    /// Returns `true` when a new award was recorded. An id missing from the
    /// catalog is a no-op (`false`) after a warning, never an error: award
    /// callers are side-effect chains that must not fail on catalog drift.
    /// Re-awarding a non-repeatable achievement is an idempotent no-op.
    pub async fn award(&self, partner_id: &str, achievement_id: &str) -> Result<bool, EngineError> {
        let Some(definition) = self.catalog.get(achievement_id) else {
            tracing::warn!(
                partner_id = %partner_id,
                achievement_id = %achievement_id,
                "Skipping award of unknown achievement"
            );
            return Ok(false);
        };

        let record = AwardedAchievement {
            partner_id: partner_id.to_string(),
            achievement_id: achievement_id.to_string(),
            completed_at: Utc::now(),
        };
        let awards_key = StoreKey::achievements(partner_id);

        if definition.repeatable {
            let seq = self
                .store
                .hincr_by(&StoreKey::achievement_seq(partner_id), achievement_id, 1)
                .await?;
            self.store
                .hset_json(&awards_key, &format!("{achievement_id}#{seq}"), &record)
                .await?;
            tracing::debug!(
                partner_id = %partner_id,
                achievement_id = %achievement_id,
                seq,
                "Achievement awarded"
            );
            return Ok(true);
        }

        let awarded = self
            .store
            .hset_nx_json(&awards_key, achievement_id, &record)
            .await?;
        if awarded {
            tracing::debug!(
                partner_id = %partner_id,
                achievement_id = %achievement_id,
                "Achievement awarded"
            );
        }
        Ok(awarded)
    }

    /// Every award instance, oldest first, with definitions joined in
    ///
    /// Awards whose definition has left the catalog are skipped.
    pub async fn earned(&self, partner_id: &str) -> Result<Vec<EarnedAchievement>, EngineError> {
        let awards: Vec<(String, AwardedAchievement)> = self
            .store
            .hget_all_json(&StoreKey::achievements(partner_id))
            .await?;

        let mut earned = Vec::with_capacity(awards.len());
        for (_, record) in awards {
            let Some(definition) = self.catalog.get(&record.achievement_id) else {
                tracing::debug!(
                    partner_id = %partner_id,
                    achievement_id = %record.achievement_id,
                    "Skipping award with no catalog definition"
                );
                continue;
            };
            earned.push(EarnedAchievement {
                definition,
                completed_at: record.completed_at,
            });
        }
        earned.sort_by(|a, b| {
            a.completed_at
                .cmp(&b.completed_at)
                .then_with(|| a.definition.id.cmp(&b.definition.id))
        });
        Ok(earned)
    }

    /// Base ids of every achievement the partner has at least one award for
    pub async fn earned_ids(&self, partner_id: &str) -> Result<HashSet<String>, EngineError> {
        let fields = self
            .store
            .hget_all_raw(&StoreKey::achievements(partner_id))
            .await?;
        Ok(fields
            .into_iter()
            .map(|(field, _)| base_id(&field).to_string())
            .collect())
    }

    /// Number of award instances, uniform over both kinds
    pub async fn count(&self, partner_id: &str, achievement_id: &str) -> Result<u32, EngineError> {
        let fields = self
            .store
            .hget_all_raw(&StoreKey::achievements(partner_id))
            .await?;
        let count = fields
            .iter()
            .filter(|(field, _)| base_id(field) == achievement_id)
            .count();
        Ok(count.try_into().unwrap_or(u32::MAX))
    }

    /// Completion summary over a category's definitions
    pub async fn progress_by_category(
        &self,
        partner_id: &str,
        category: AchievementCategory,
    ) -> Result<CategoryProgress, EngineError> {
        let definitions = self.catalog.by_category(category);
        let awards: Vec<(String, AwardedAchievement)> = self
            .store
            .hget_all_json(&StoreKey::achievements(partner_id))
            .await?;

        let mut achievements = Vec::with_capacity(definitions.len());
        let mut completed = 0u32;
        for def in &definitions {
            let first_award = awards
                .iter()
                .filter(|(_, record)| record.achievement_id == def.id)
                .map(|(_, record)| record.completed_at)
                .min();
            if first_award.is_some() {
                completed += 1;
            }
            achievements.push(AchievementProgress {
                achievement_id: def.id.clone(),
                completed: first_award.is_some(),
                completed_at: first_award,
            });
        }

        let total = definitions.len().try_into().unwrap_or(u32::MAX);
        let percentage = if total == 0 {
            0
        } else {
            ((f64::from(completed) / f64::from(total)) * 100.0).round() as u32
        };
        Ok(CategoryProgress {
            total,
            completed,
            percentage,
            achievements,
        })
    }

    /// Remove every award instance of one achievement (admin override)
    ///
    /// Bypasses idempotency: a later `award` records the achievement again.
    /// Returns how many instances were removed.
    pub async fn remove(&self, partner_id: &str, achievement_id: &str) -> Result<u32, EngineError> {
        let awards_key = StoreKey::achievements(partner_id);
        let fields = self.store.hget_all_raw(&awards_key).await?;

        let mut removed = 0u32;
        for (field, _) in fields {
            if base_id(&field) == achievement_id && self.store.hdel(&awards_key, &field).await? {
                removed += 1;
            }
        }
        // Reset the repeatable sequence counter alongside the instances
        self.store
            .hdel(&StoreKey::achievement_seq(partner_id), achievement_id)
            .await?;

        tracing::info!(
            partner_id = %partner_id,
            achievement_id = %achievement_id,
            removed,
            "Achievement awards removed"
        );
        Ok(removed)
    }

    /// Delete every award and sequence counter for a partner (admin/test reset)
    ///
    /// Returns how many award instances were deleted.
    pub async fn clear_all(&self, partner_id: &str) -> Result<u64, EngineError> {
        let awards_key = StoreKey::achievements(partner_id);
        let count = self.store.hget_all_raw(&awards_key).await?.len() as u64;
        self.store.delete(&awards_key).await?;
        self.store
            .delete(&StoreKey::achievement_seq(partner_id))
            .await?;
        Ok(count)
    }
}

/// Strip the `#{seq}` suffix that repeatable award fields carry
fn base_id(field: &str) -> &str {
    field.split_once('#').map(|(base, _)| base).unwrap_or(field)
}
