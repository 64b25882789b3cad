//! Stored record types shared by all engine services
//!
//! Every record here is persisted as a JSON document through the typed store
//! API. Shapes are part of the stored-data contract; renames are breaking.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{
    AchievementCategory, DealStatus, PartnerTier, RatingEventType, TierChangeReason,
};

// ============================================================================
// Partner
// ============================================================================

/// Partner master record
///
/// `created_at` anchors the annual renewal cycle until the first renewal
/// sets `last_renewal_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub id: String,
    pub name: String,
    pub tier: PartnerTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_renewal_at: Option<DateTime<Utc>>,
}

impl PartnerRecord {
    /// Create a new bronze partner with both timestamps set to `now`
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier: PartnerTier::Bronze,
            created_at: now,
            updated_at: now,
            last_renewal_at: None,
        }
    }
}

// ============================================================================
// Rating events
// ============================================================================

/// One append-only rating event
///
/// Member of the per-partner event sorted set, scored by `created_at`
/// millis. Never mutated after the append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEvent {
    /// Uuid v4 in text form
    pub id: String,
    pub partner_id: String,
    /// User at the partner who triggered the event
    pub user_id: String,
    pub event_type: RatingEventType,
    /// Always `event_type.points()`; stored for audit readability
    pub points: i32,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Achievements
// ============================================================================

/// Catalog entry describing one achievement
///
/// `deny_unknown_fields` keeps malformed remote overrides from silently
/// passing as valid definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub category: AchievementCategory,
    pub points: i32,
    pub repeatable: bool,
    /// Tier this achievement is associated with (informational)
    pub tier: PartnerTier,
}

/// One award stored in the per-partner achievements hash
///
/// Non-repeatable awards use the achievement id as the hash field;
/// repeatable awards use `{id}#{seq}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardedAchievement {
    pub partner_id: String,
    pub achievement_id: String,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Deals and documents
// ============================================================================

/// Registered deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    pub id: String,
    pub partner_id: String,
    pub status: DealStatus,
    /// Whether the partner sourced the lead themselves
    pub partner_generated: bool,
    /// Contract population size, when known (revenue factor input)
    pub population: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Compliance document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub partner_id: String,
    pub name: String,
    pub required: bool,
    pub signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Annual metrics
// ============================================================================

/// Per-cycle counters, reset to zero at every renewal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnualMetrics {
    pub certifications: u32,
    pub opportunities: u32,
    pub deals_won: u32,
}

impl AnnualMetrics {
    /// Whether every counter meets the given requirement
    pub fn meets(&self, required: &AnnualMetrics) -> bool {
        self.certifications >= required.certifications
            && self.opportunities >= required.opportunities
            && self.deals_won >= required.deals_won
    }
}

// ============================================================================
// Rating
// ============================================================================

/// Per-factor scores, each clamped to [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub deal_quality: f64,
    pub engagement: f64,
    pub certification: f64,
    pub compliance: f64,
    pub revenue: f64,
}

/// Cached result of one rating calculation
///
/// Advisory only: possibly stale, always re-derivable from the event log
/// and records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCalculation {
    pub partner_id: String,
    /// Weighted total, 0-100
    pub total_score: u32,
    /// Tier the score maps to (not necessarily the stored tier)
    pub tier: PartnerTier,
    pub factors: FactorScores,
    pub calculated_at: DateTime<Utc>,
}

// ============================================================================
// Tier history
// ============================================================================

/// One append-only tier change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHistoryEntry {
    pub partner_id: String,
    pub tier: PartnerTier,
    pub previous_tier: PartnerTier,
    pub reason: TierChangeReason,
    pub changed_at: DateTime<Utc>,
}
