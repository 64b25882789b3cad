//! Domain logic for partner lifecycle management
//!
//! - `partners` - Partner registry, deals, documents, and annual counters
//! - `achievements` - Milestone catalog and idempotent award tracking
//! - `rating` - Event log, factor formulas, and the weighted score
//! - `tier` - Tier table, eligibility checks, and annual renewal
//! - `records` / `types` - Shared domain records and enums

pub mod achievements;
pub mod partners;
pub mod rating;
pub mod records;
pub mod tier;
pub mod types;

pub use partners::PartnerDirectory;
pub use records::{
    AchievementDefinition, AnnualMetrics, AwardedAchievement, DealRecord, DocumentRecord,
    FactorScores, PartnerRecord, RatingCalculation, RatingEvent, TierHistoryEntry,
};
pub use types::{AchievementCategory, DealStatus, PartnerTier, RatingEventType, TierChangeReason};
