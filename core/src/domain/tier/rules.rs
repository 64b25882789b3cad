//! Tier requirement rules
//!
//! The static table every tier decision reads: rating thresholds, required
//! achievements, annual quotas, and the benefits each tier carries.
//! Requirements are per-tier, not cumulative.

use crate::domain::records::AnnualMetrics;
use crate::domain::types::PartnerTier;

/// Requirements and benefits of one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierRequirement {
    pub tier: PartnerTier,
    /// Minimum weighted rating score
    pub min_rating: u32,
    /// Achievement ids that must all be earned
    pub required_achievements: &'static [&'static str],
    /// Informational extras, never blocking
    pub optional_achievements: &'static [&'static str],
    /// Annual counter quotas within one renewal cycle
    pub annual: AnnualMetrics,
    /// Partner discount at this tier
    pub discount_percent: u32,
    /// Program features unlocked at this tier
    pub features: &'static [&'static str],
}

/// Requirements per tier, indexed by tier discriminant
pub const TIER_REQUIREMENTS: [TierRequirement; 4] = [
    TierRequirement {
        tier: PartnerTier::Bronze,
        min_rating: 0,
        required_achievements: &[],
        optional_achievements: &[],
        annual: AnnualMetrics {
            certifications: 0,
            opportunities: 0,
            deals_won: 0,
        },
        discount_percent: 0,
        features: &["portal_access"],
    },
    TierRequirement {
        tier: PartnerTier::Silver,
        min_rating: 50,
        required_achievements: &["first_certification"],
        optional_achievements: &[],
        annual: AnnualMetrics {
            certifications: 1,
            opportunities: 1,
            deals_won: 0,
        },
        discount_percent: 5,
        features: &["portal_access", "lead_sharing"],
    },
    TierRequirement {
        tier: PartnerTier::Gold,
        min_rating: 70,
        required_achievements: &["second_certification", "first_deal_won"],
        optional_achievements: &[],
        annual: AnnualMetrics {
            certifications: 2,
            opportunities: 2,
            deals_won: 1,
        },
        discount_percent: 10,
        features: &["portal_access", "lead_sharing", "copilot_priority"],
    },
    TierRequirement {
        tier: PartnerTier::Platinum,
        min_rating: 90,
        required_achievements: &["third_certification", "two_deals_won"],
        optional_achievements: &[],
        annual: AnnualMetrics {
            certifications: 3,
            opportunities: 4,
            deals_won: 2,
        },
        discount_percent: 15,
        features: &[
            "portal_access",
            "lead_sharing",
            "copilot_priority",
            "dedicated_manager",
        ],
    },
];

/// Requirements for one tier
pub fn requirements_for(tier: PartnerTier) -> &'static TierRequirement {
    &TIER_REQUIREMENTS[tier as usize]
}
