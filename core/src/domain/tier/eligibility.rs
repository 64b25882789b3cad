//! Tier eligibility
//!
//! Answers "can this partner advance, and if not, what is in the way".
//! Checks run against the immediate next tier only; there is no skipping.
//! The rating check always uses a fresh calculation, never the persisted
//! advisory one.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::achievements::AchievementTracker;
use crate::domain::partners::PartnerDirectory;
use crate::domain::rating::RatingService;
use crate::domain::tier::rules::requirements_for;
use crate::domain::types::PartnerTier;
use crate::error::EngineError;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Verdict on advancing to the next tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierEligibility {
    pub partner_id: String,
    pub current_tier: PartnerTier,
    /// `None` at the top tier
    pub next_tier: Option<PartnerTier>,
    pub eligible: bool,
    pub blockers: EligibilityBlockers,
}

/// What stands between a partner and the next tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityBlockers {
    /// Rating below the next tier's minimum
    pub rating: bool,
    /// Required achievement ids not yet earned, in tier-table order
    pub achievements: Vec<String>,
    /// One or more annual counters below the next tier's quotas
    pub annual_requirements: bool,
}

impl EligibilityBlockers {
    fn none() -> Self {
        Self {
            rating: false,
            achievements: Vec::new(),
            annual_requirements: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.rating && self.achievements.is_empty() && !self.annual_requirements
    }
}

/// Progress toward a single numeric requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricProgress {
    pub current: u32,
    pub required: u32,
    pub met: bool,
}

impl MetricProgress {
    fn new(current: u32, required: u32) -> Self {
        Self {
            current,
            required,
            met: current >= required,
        }
    }
}

/// Expanded requirement-by-requirement view of the next tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextTierReport {
    pub partner_id: String,
    pub current_tier: PartnerTier,
    /// `None` at the top tier; the breakdowns below are then all empty
    pub next_tier: Option<PartnerTier>,
    pub rating: MetricProgress,
    pub certifications: MetricProgress,
    pub opportunities: MetricProgress,
    pub deals_won: MetricProgress,
    /// Required achievement ids already earned, in tier-table order
    pub achievements_completed: Vec<String>,
    /// Required achievement ids still missing, in tier-table order
    pub achievements_remaining: Vec<String>,
}

// ============================================================================
// ELIGIBILITY ENGINE
// ============================================================================

/// Evaluates tier advancement against the tier table
pub struct TierEligibilityEngine {
    directory: Arc<PartnerDirectory>,
    tracker: Arc<AchievementTracker>,
    rating: Arc<RatingService>,
}

impl TierEligibilityEngine {
    pub fn new(
        directory: Arc<PartnerDirectory>,
        tracker: Arc<AchievementTracker>,
        rating: Arc<RatingService>,
    ) -> Self {
        Self {
            directory,
            tracker,
            rating,
        }
    }

    /// Can the partner advance to the immediate next tier?
    pub async fn eligibility(&self, partner_id: &str) -> Result<TierEligibility, EngineError> {
        let partner = self.directory.get(partner_id).await?;

        let Some(next_tier) = partner.tier.next() else {
            return Ok(TierEligibility {
                partner_id: partner.id,
                current_tier: partner.tier,
                next_tier: None,
                eligible: false,
                blockers: EligibilityBlockers::none(),
            });
        };

        let requirements = requirements_for(next_tier);
        let calculation = self.rating.calculate(partner_id).await?;
        let earned = self.tracker.earned_ids(partner_id).await?;
        let metrics = self.directory.annual_metrics(partner_id).await?;

        let blockers = EligibilityBlockers {
            rating: calculation.total_score < requirements.min_rating,
            achievements: requirements
                .required_achievements
                .iter()
                .filter(|id| !earned.contains(**id))
                .map(|id| id.to_string())
                .collect(),
            annual_requirements: !metrics.meets(&requirements.annual),
        };
        let eligible = blockers.is_empty();

        tracing::debug!(
            partner_id = %partner_id,
            next_tier = %next_tier.as_str(),
            eligible,
            "Eligibility evaluated"
        );

        Ok(TierEligibility {
            partner_id: partner.id,
            current_tier: partner.tier,
            next_tier: Some(next_tier),
            eligible,
            blockers,
        })
    }

    /// Per-requirement breakdown for the next tier
    pub async fn next_tier_requirements(
        &self,
        partner_id: &str,
    ) -> Result<NextTierReport, EngineError> {
        let partner = self.directory.get(partner_id).await?;

        let Some(next_tier) = partner.tier.next() else {
            return Ok(NextTierReport {
                partner_id: partner.id,
                current_tier: partner.tier,
                next_tier: None,
                rating: MetricProgress::new(0, 0),
                certifications: MetricProgress::new(0, 0),
                opportunities: MetricProgress::new(0, 0),
                deals_won: MetricProgress::new(0, 0),
                achievements_completed: Vec::new(),
                achievements_remaining: Vec::new(),
            });
        };

        let requirements = requirements_for(next_tier);
        let calculation = self.rating.calculate(partner_id).await?;
        let earned = self.tracker.earned_ids(partner_id).await?;
        let metrics = self.directory.annual_metrics(partner_id).await?;

        let mut achievements_completed = Vec::new();
        let mut achievements_remaining = Vec::new();
        for id in requirements.required_achievements {
            if earned.contains(*id) {
                achievements_completed.push(id.to_string());
            } else {
                achievements_remaining.push(id.to_string());
            }
        }

        Ok(NextTierReport {
            partner_id: partner.id,
            current_tier: partner.tier,
            next_tier: Some(next_tier),
            rating: MetricProgress::new(calculation.total_score, requirements.min_rating),
            certifications: MetricProgress::new(
                metrics.certifications,
                requirements.annual.certifications,
            ),
            opportunities: MetricProgress::new(
                metrics.opportunities,
                requirements.annual.opportunities,
            ),
            deals_won: MetricProgress::new(metrics.deals_won, requirements.annual.deals_won),
            achievements_completed,
            achievements_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreConfig;
    use crate::domain::achievements::AchievementCatalog;
    use crate::domain::partners::AnnualField;
    use crate::domain::rating::RatingEventLog;
    use crate::domain::records::PartnerRecord;
    use crate::domain::types::{RatingEventType, TierChangeReason};
    use crate::store::StoreService;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct Fixture {
        directory: Arc<PartnerDirectory>,
        tracker: Arc<AchievementTracker>,
        log: Arc<RatingEventLog>,
        engine: TierEligibilityEngine,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(StoreService::new(&StoreConfig::default()).await.unwrap());
        let catalog = Arc::new(AchievementCatalog::load_embedded().unwrap());
        let directory = Arc::new(PartnerDirectory::new(Arc::clone(&store)));
        let tracker = Arc::new(AchievementTracker::new(Arc::clone(&store), catalog));
        let log = Arc::new(RatingEventLog::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&tracker),
        ));
        let rating = Arc::new(RatingService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&log),
        ));
        let engine = TierEligibilityEngine::new(
            Arc::clone(&directory),
            Arc::clone(&tracker),
            Arc::clone(&rating),
        );
        directory
            .register(&PartnerRecord::new("p1", "Acme Corp", Utc::now()))
            .await
            .unwrap();
        Fixture {
            directory,
            tracker,
            log,
            engine,
        }
    }

    /// Give spawned achievement chains time to land
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_platinum_partner_has_nothing_to_advance_to() {
        let f = fixture().await;
        f.directory
            .set_tier("p1", PartnerTier::Platinum, TierChangeReason::Manual)
            .await
            .unwrap();

        let eligibility = f.engine.eligibility("p1").await.unwrap();
        assert!(!eligibility.eligible);
        assert_eq!(eligibility.next_tier, None);
        assert!(eligibility.blockers.is_empty());

        let report = f.engine.next_tier_requirements("p1").await.unwrap();
        assert_eq!(report.next_tier, None);
        assert!(report.achievements_completed.is_empty());
        assert!(report.achievements_remaining.is_empty());
        assert!(report.rating.met);
    }

    #[tokio::test]
    async fn test_unknown_partner_fails() {
        let f = fixture().await;
        let err = f.engine.eligibility("ghost").await.unwrap_err();
        assert!(matches!(err, EngineError::PartnerNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fresh_partner_blocked_on_achievements_and_annual() {
        let f = fixture().await;

        let eligibility = f.engine.eligibility("p1").await.unwrap();
        assert_eq!(eligibility.current_tier, PartnerTier::Bronze);
        assert_eq!(eligibility.next_tier, Some(PartnerTier::Silver));
        assert!(!eligibility.eligible);
        // A fresh partner scores 50, exactly silver's minimum
        assert!(!eligibility.blockers.rating);
        assert_eq!(eligibility.blockers.achievements, vec!["first_certification"]);
        assert!(eligibility.blockers.annual_requirements);
    }

    #[tokio::test]
    async fn test_partner_becomes_eligible_for_silver() {
        let f = fixture().await;

        f.log
            .log_event(
                "p1",
                "u1",
                RatingEventType::CertificationEarned,
                BTreeMap::new(),
            )
            .await
            .unwrap();
        f.log
            .log_event(
                "p1",
                "u1",
                RatingEventType::OpportunityRegistered,
                BTreeMap::new(),
            )
            .await
            .unwrap();
        settle().await;

        let eligibility = f.engine.eligibility("p1").await.unwrap();
        assert!(eligibility.eligible, "blockers: {:?}", eligibility.blockers);
        assert_eq!(eligibility.next_tier, Some(PartnerTier::Silver));
        assert!(eligibility.blockers.is_empty());
    }

    #[tokio::test]
    async fn test_next_tier_report_for_gold_candidate() {
        let f = fixture().await;
        f.directory
            .set_tier("p1", PartnerTier::Silver, TierChangeReason::Manual)
            .await
            .unwrap();
        f.tracker.award("p1", "second_certification").await.unwrap();
        f.directory
            .bump_annual("p1", AnnualField::Certifications, 1)
            .await
            .unwrap();

        let report = f.engine.next_tier_requirements("p1").await.unwrap();
        assert_eq!(report.current_tier, PartnerTier::Silver);
        assert_eq!(report.next_tier, Some(PartnerTier::Gold));
        assert_eq!(report.rating.required, 70);
        assert_eq!(
            report.certifications,
            MetricProgress {
                current: 1,
                required: 2,
                met: false
            }
        );
        assert_eq!(report.opportunities.required, 2);
        assert!(!report.opportunities.met);
        assert_eq!(report.deals_won.required, 1);
        assert_eq!(report.achievements_completed, vec!["second_certification"]);
        assert_eq!(report.achievements_remaining, vec!["first_deal_won"]);
    }

    #[tokio::test]
    async fn test_blocker_order_follows_tier_table() {
        let f = fixture().await;
        f.directory
            .set_tier("p1", PartnerTier::Gold, TierChangeReason::Manual)
            .await
            .unwrap();

        let eligibility = f.engine.eligibility("p1").await.unwrap();
        assert_eq!(eligibility.next_tier, Some(PartnerTier::Platinum));
        assert_eq!(
            eligibility.blockers.achievements,
            vec!["third_certification", "two_deals_won"]
        );
    }
}
