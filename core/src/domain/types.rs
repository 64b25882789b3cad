//! Classification enums for the partner domain
//!
//! These enums are used across the store records and all engine services for
//! consistent classification of partners, deals, events, and tier changes.

use serde::{Deserialize, Serialize};

// ============================================================================
// TIER HIERARCHY
// ============================================================================

/// Partner tier levels, ordered lowest to highest
///
/// Variant order defines the hierarchy: the derived `Ord` makes
/// `Bronze < Silver < Gold < Platinum` hold, which tier promotion and
/// demotion logic relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PartnerTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl PartnerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    /// All tiers, lowest to highest
    pub fn all() -> [PartnerTier; 4] {
        [Self::Bronze, Self::Silver, Self::Gold, Self::Platinum]
    }

    /// The next tier up, or `None` at Platinum
    pub fn next(&self) -> Option<PartnerTier> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => None,
        }
    }

    /// The next tier down, or `None` at Bronze
    pub fn previous(&self) -> Option<PartnerTier> {
        match self {
            Self::Bronze => None,
            Self::Silver => Some(Self::Bronze),
            Self::Gold => Some(Self::Silver),
            Self::Platinum => Some(Self::Gold),
        }
    }
}

// ============================================================================
// ACHIEVEMENTS
// ============================================================================

/// Achievement categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Certification,
    Deals,
    Compliance,
    Training,
    Engagement,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certification => "certification",
            Self::Deals => "deals",
            Self::Compliance => "compliance",
            Self::Training => "training",
            Self::Engagement => "engagement",
        }
    }
}

// ============================================================================
// RATING EVENTS
// ============================================================================

/// Rating event types with their fixed point values
///
/// Wire names are SCREAMING_SNAKE_CASE to stay stable identifiers in stored
/// JSON. Points come exclusively from [`RatingEventType::points`]; callers
/// never supply them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingEventType {
    CopilotSessionCompleted,
    TrainingModuleCompleted,
    CertificationEarned,
    CertificationExpired,
    DealClosedWon,
    DealClosedLost,
    OpportunityRegistered,
    DocumentSigned,
    // rename_all would split the trailing number as "INACTIVE30_DAYS"
    #[serde(rename = "LOGIN_INACTIVE_30_DAYS")]
    LoginInactive30Days,
}

impl RatingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CopilotSessionCompleted => "COPILOT_SESSION_COMPLETED",
            Self::TrainingModuleCompleted => "TRAINING_MODULE_COMPLETED",
            Self::CertificationEarned => "CERTIFICATION_EARNED",
            Self::CertificationExpired => "CERTIFICATION_EXPIRED",
            Self::DealClosedWon => "DEAL_CLOSED_WON",
            Self::DealClosedLost => "DEAL_CLOSED_LOST",
            Self::OpportunityRegistered => "OPPORTUNITY_REGISTERED",
            Self::DocumentSigned => "DOCUMENT_SIGNED",
            Self::LoginInactive30Days => "LOGIN_INACTIVE_30_DAYS",
        }
    }

    /// Points contributed by one event of this type
    pub fn points(&self) -> i32 {
        match self {
            Self::CopilotSessionCompleted => 5,
            Self::TrainingModuleCompleted => 10,
            Self::CertificationEarned => 20,
            Self::CertificationExpired => -20,
            Self::DealClosedWon => 15,
            Self::DealClosedLost => 0,
            Self::OpportunityRegistered => 5,
            Self::DocumentSigned => 5,
            Self::LoginInactive30Days => -10,
        }
    }
}

// ============================================================================
// DEALS
// ============================================================================

/// Deal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Submitted,
    Approved,
    Rejected,
    Won,
    Lost,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Whether the deal passed registration review
    ///
    /// Won and lost deals were necessarily approved first.
    pub fn counts_as_approved(&self) -> bool {
        match self {
            Self::Approved | Self::Won | Self::Lost => true,
            Self::Submitted | Self::Rejected => false,
        }
    }
}

// ============================================================================
// TIER CHANGES
// ============================================================================

/// Why a partner's tier changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierChangeReason {
    Manual,
    AnnualRenewal,
    AchievementTriggered,
}

impl TierChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AnnualRenewal => "annual_renewal",
            Self::AchievementTriggered => "achievement_triggered",
        }
    }
}
