//! # Alliance Core
//!
//! **Partner lifecycle rules engine**: tiers, ratings, and achievements for
//! a partner program.
//!
//! Everything a partner does flows in as rating events or records (deals,
//! documents, certifications). The engine turns that activity into:
//!
//! - **Achievements**: milestone awards driven by event chains, idempotent
//!   under concurrency
//! - **Ratings**: a weighted 0-100 score over five activity factors
//! - **Tiers**: bronze through platinum, promoted by score and eligibility,
//!   re-earned every twelve months by annual renewal
//!
//! State lives behind a pluggable store (in-memory for embedding and tests,
//! Redis for shared deployments). [`PartnerEngine`] wires the services
//! together:
//!
//! ```no_run
//! use alliance_core::{EngineConfig, PartnerEngine};
//!
//! # async fn run() -> Result<(), alliance_core::EngineError> {
//! let engine = PartnerEngine::new(EngineConfig::default()).await?;
//! engine.health_check().await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;

pub use crate::core::config::{EngineConfig, StoreBackendType, StoreConfig};
pub use crate::domain::records::{
    AchievementDefinition, AnnualMetrics, DealRecord, DocumentRecord, FactorScores, PartnerRecord,
    RatingCalculation, RatingEvent, TierHistoryEntry,
};
pub use crate::domain::types::{
    AchievementCategory, DealStatus, PartnerTier, RatingEventType, TierChangeReason,
};
pub use crate::engine::PartnerEngine;
pub use crate::error::EngineError;
