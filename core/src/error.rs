//! Unified error type for engine operations
//!
//! Wraps store-layer failures and adds the engine's own domain errors so
//! callers handle one error type across every service.

use thiserror::Error;

use crate::store::StoreError;

/// Unified error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Partner does not exist in the directory
    #[error("Partner not found: {partner_id}")]
    PartnerNotFound { partner_id: String },

    /// Achievement id is not in the catalog
    #[error("Unknown achievement: {achievement_id}")]
    UnknownAchievement { achievement_id: String },

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Create a partner not found error
    pub fn partner_not_found(partner_id: impl Into<String>) -> Self {
        Self::PartnerNotFound {
            partner_id: partner_id.into(),
        }
    }

    /// Create an unknown achievement error
    pub fn unknown_achievement(achievement_id: impl Into<String>) -> Self {
        Self::UnknownAchievement {
            achievement_id: achievement_id.into(),
        }
    }

    /// Check if this error might succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            Self::PartnerNotFound { .. } | Self::UnknownAchievement { .. } | Self::Config(_) => {
                false
            }
        }
    }
}
