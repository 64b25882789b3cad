//! Partner rating
//!
//! Combines the five factor formulas into a weighted 0-100 score, maps the
//! score to a tier, and persists advisory calculations. The score-derived
//! tier can promote a partner but never demote one; demotion belongs to the
//! renewal processor alone.

pub mod events;
pub mod factors;

use std::sync::Arc;

use chrono::Utc;

pub use events::RatingEventLog;

use crate::domain::partners::PartnerDirectory;
use crate::domain::records::{FactorScores, RatingCalculation, RatingEvent};
use crate::domain::tier::rules::TIER_REQUIREMENTS;
use crate::domain::types::{PartnerTier, TierChangeReason};
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

// ============================================================================
// WEIGHTS
// ============================================================================

// Factor weights, summing to 1.0
const DEAL_QUALITY_WEIGHT: f64 = 0.30;
const ENGAGEMENT_WEIGHT: f64 = 0.25;
const CERTIFICATION_WEIGHT: f64 = 0.20;
const COMPLIANCE_WEIGHT: f64 = 0.15;
const REVENUE_WEIGHT: f64 = 0.10;

/// Weighted total over the factor scores, rounded to 0-100
pub fn weighted_total(factors: &FactorScores) -> u32 {
    let weighted = factors.deal_quality * DEAL_QUALITY_WEIGHT
        + factors.engagement * ENGAGEMENT_WEIGHT
        + factors.certification * CERTIFICATION_WEIGHT
        + factors.compliance * COMPLIANCE_WEIGHT
        + factors.revenue * REVENUE_WEIGHT;
    weighted.round().clamp(0.0, 100.0) as u32
}

/// Tier a score qualifies for, by the rating thresholds in the tier table
pub fn tier_from_score(score: u32) -> PartnerTier {
    for requirement in TIER_REQUIREMENTS.iter().rev() {
        if score >= requirement.min_rating {
            return requirement.tier;
        }
    }
    PartnerTier::Bronze
}

// ============================================================================
// RATING SERVICE
// ============================================================================

/// Rating calculator backed by the store
pub struct RatingService {
    store: Arc<StoreService>,
    directory: Arc<PartnerDirectory>,
    events: Arc<RatingEventLog>,
}

impl RatingService {
    pub fn new(
        store: Arc<StoreService>,
        directory: Arc<PartnerDirectory>,
        events: Arc<RatingEventLog>,
    ) -> Self {
        Self {
            store,
            directory,
            events,
        }
    }

    /// Compute a fresh rating from the partner's records and event log
    pub async fn calculate(&self, partner_id: &str) -> Result<RatingCalculation, EngineError> {
        self.directory.get(partner_id).await?;

        let deals = self.directory.deals_for(partner_id).await?;
        let documents = self.directory.documents_for(partner_id).await?;
        let all_events = self.events.events_for(partner_id).await?;

        let window_start = Utc::now() - chrono::Duration::days(factors::ENGAGEMENT_WINDOW_DAYS);
        let recent: Vec<RatingEvent> = all_events
            .iter()
            .filter(|e| e.created_at >= window_start)
            .cloned()
            .collect();

        let factors = FactorScores {
            deal_quality: factors::deal_quality(&deals),
            engagement: factors::engagement(&recent),
            certification: factors::certification(&all_events),
            compliance: factors::compliance(&documents),
            revenue: factors::revenue(&deals),
        };
        let total_score = weighted_total(&factors);
        let tier = tier_from_score(total_score);

        tracing::trace!(
            partner_id = %partner_id,
            deal_quality = factors.deal_quality,
            engagement = factors.engagement,
            certification = factors.certification,
            compliance = factors.compliance,
            revenue = factors.revenue,
            total_score,
            "Rating calculated"
        );

        Ok(RatingCalculation {
            partner_id: partner_id.to_string(),
            total_score,
            tier,
            factors,
            calculated_at: Utc::now(),
        })
    }

    /// Last persisted calculation, if any
    ///
    /// Advisory: possibly stale relative to the event log.
    pub async fn cached(&self, partner_id: &str) -> Result<Option<RatingCalculation>, EngineError> {
        Ok(self.store.get_json(&StoreKey::rating(partner_id)).await?)
    }

    /// Recalculate, persist, and promote the partner if the score allows
    ///
    /// When the score-derived tier is higher than the stored tier, the
    /// partner is promoted with an achievement-triggered history entry.
    /// A lower score-derived tier never demotes.
    pub async fn recalculate_and_persist(
        &self,
        partner_id: &str,
    ) -> Result<RatingCalculation, EngineError> {
        let calculation = self.calculate(partner_id).await?;
        self.store
            .set_json(&StoreKey::rating(partner_id), &calculation, None)
            .await?;

        let partner = self.directory.get(partner_id).await?;
        if calculation.tier > partner.tier {
            self.directory
                .set_tier(
                    partner_id,
                    calculation.tier,
                    TierChangeReason::AchievementTriggered,
                )
                .await?;
        }

        Ok(calculation)
    }
}
