//! Engine facade
//!
//! Wires the store and every domain service into one handle. Callers reach
//! services through the public fields; nothing here owns logic of its own.

use std::sync::Arc;

use crate::core::config::EngineConfig;
use crate::domain::achievements::{AchievementCatalog, AchievementTracker};
use crate::domain::partners::PartnerDirectory;
use crate::domain::rating::{RatingEventLog, RatingService};
use crate::domain::tier::{RenewalProcessor, TierEligibilityEngine};
use crate::error::EngineError;
use crate::store::StoreService;

/// Fully wired partner rules engine
pub struct PartnerEngine {
    pub config: EngineConfig,
    pub store: Arc<StoreService>,
    pub catalog: Arc<AchievementCatalog>,
    pub partners: Arc<PartnerDirectory>,
    pub achievements: Arc<AchievementTracker>,
    pub events: Arc<RatingEventLog>,
    pub rating: Arc<RatingService>,
    pub eligibility: Arc<TierEligibilityEngine>,
    pub renewal: Arc<RenewalProcessor>,
}

impl PartnerEngine {
    /// Build the store and wire every service
    ///
    /// Catalog overrides that fail to load are logged and skipped; the
    /// embedded defaults always apply.
    pub async fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let store = Arc::new(StoreService::new(&config.store).await?);
        tracing::debug!(backend = store.backend_name(), "Store initialized");

        let catalog = Arc::new(AchievementCatalog::load_embedded()?);
        match catalog.refresh_from_store(&store).await {
            Ok(0) => {}
            Ok(count) => tracing::debug!(count, "Catalog overrides applied"),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load catalog overrides, using embedded defaults");
            }
        }

        let partners = Arc::new(PartnerDirectory::new(Arc::clone(&store)));
        let achievements = Arc::new(AchievementTracker::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
        ));
        let events = Arc::new(RatingEventLog::new(
            Arc::clone(&store),
            Arc::clone(&partners),
            Arc::clone(&achievements),
        ));
        let rating = Arc::new(RatingService::new(
            Arc::clone(&store),
            Arc::clone(&partners),
            Arc::clone(&events),
        ));
        let eligibility = Arc::new(TierEligibilityEngine::new(
            Arc::clone(&partners),
            Arc::clone(&achievements),
            Arc::clone(&rating),
        ));
        let renewal = Arc::new(RenewalProcessor::new(
            Arc::clone(&partners),
            Arc::clone(&store),
        ));

        tracing::debug!("Engine initialized");

        Ok(Self {
            config,
            store,
            catalog,
            partners,
            achievements,
            events,
            rating,
            eligibility,
            renewal,
        })
    }

    /// Store connectivity check
    pub async fn health_check(&self) -> Result<(), EngineError> {
        Ok(self.store.health_check().await?)
    }
}
