//! Rating event log
//!
//! Append-only per-partner event history. Logging an event also increments
//! the matching annual counter in the same call and kicks off achievement
//! side effects on a detached task; the side effects can fail without ever
//! failing the logged event.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::achievements::AchievementTracker;
use crate::domain::partners::{AnnualField, PartnerDirectory};
use crate::domain::records::RatingEvent;
use crate::domain::types::RatingEventType;
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

// ============================================================================
// ACHIEVEMENT CHAINS
// ============================================================================

/// Certification milestones, earned in order
const CERTIFICATION_CHAIN: &[&str] = &[
    "first_certification",
    "second_certification",
    "third_certification",
];
/// Deal milestones, earned in order
const DEAL_CHAIN: &[&str] = &["first_deal_won", "two_deals_won"];
/// Repeatable: every completion records an instance
const TRAINING_CHAIN: &[&str] = &["training_module"];
const DOCUMENT_CHAIN: &[&str] = &["first_document_signed"];
const COPILOT_CHAIN: &[&str] = &["first_copilot_session"];
const NO_CHAIN: &[&str] = &[];

/// Achievements an event type can trigger, in award order
fn achievement_chain(event_type: RatingEventType) -> &'static [&'static str] {
    match event_type {
        RatingEventType::CertificationEarned => CERTIFICATION_CHAIN,
        RatingEventType::DealClosedWon => DEAL_CHAIN,
        RatingEventType::TrainingModuleCompleted => TRAINING_CHAIN,
        RatingEventType::DocumentSigned => DOCUMENT_CHAIN,
        RatingEventType::CopilotSessionCompleted => COPILOT_CHAIN,
        RatingEventType::CertificationExpired
        | RatingEventType::DealClosedLost
        | RatingEventType::OpportunityRegistered
        | RatingEventType::LoginInactive30Days => NO_CHAIN,
    }
}

// ============================================================================
// EVENT LOG
// ============================================================================

/// Rating event log backed by the store
pub struct RatingEventLog {
    store: Arc<StoreService>,
    directory: Arc<PartnerDirectory>,
    tracker: Arc<AchievementTracker>,
}

impl RatingEventLog {
    pub fn new(
        store: Arc<StoreService>,
        directory: Arc<PartnerDirectory>,
        tracker: Arc<AchievementTracker>,
    ) -> Self {
        Self {
            store,
            directory,
            tracker,
        }
    }

    /// Append an event to a partner's log
    ///
    /// Points always come from the event type's table. The returned event has
    /// been durably appended before any side effect runs; achievement awards
    /// happen on a detached task and their failures are logged, not surfaced.
    pub async fn log_event(
        &self,
        partner_id: &str,
        user_id: &str,
        event_type: RatingEventType,
        metadata: BTreeMap<String, String>,
    ) -> Result<RatingEvent, EngineError> {
        self.directory.get(partner_id).await?;

        let now = Utc::now();
        let event = RatingEvent {
            id: Uuid::new_v4().to_string(),
            partner_id: partner_id.to_string(),
            user_id: user_id.to_string(),
            event_type,
            points: event_type.points(),
            metadata,
            created_at: now,
        };
        self.store
            .zadd_json(
                &StoreKey::events(partner_id),
                now.timestamp_millis(),
                &event,
            )
            .await?;

        self.bump_annual_for(partner_id, event_type).await?;

        tracing::debug!(
            partner_id = %partner_id,
            event_type = event_type.as_str(),
            points = event.points,
            "Rating event logged"
        );

        let chain = achievement_chain(event_type);
        if !chain.is_empty() {
            let tracker = Arc::clone(&self.tracker);
            let partner_id = partner_id.to_string();
            tokio::spawn(async move {
                apply_chain(tracker, partner_id, chain).await;
            });
        }

        Ok(event)
    }

    /// Increment the annual counter the event type maps to, if any
    async fn bump_annual_for(
        &self,
        partner_id: &str,
        event_type: RatingEventType,
    ) -> Result<(), EngineError> {
        let field = match event_type {
            RatingEventType::CertificationEarned => AnnualField::Certifications,
            RatingEventType::OpportunityRegistered => AnnualField::Opportunities,
            RatingEventType::DealClosedWon => AnnualField::DealsWon,
            RatingEventType::CopilotSessionCompleted
            | RatingEventType::TrainingModuleCompleted
            | RatingEventType::CertificationExpired
            | RatingEventType::DealClosedLost
            | RatingEventType::DocumentSigned
            | RatingEventType::LoginInactive30Days => return Ok(()),
        };
        self.directory.bump_annual(partner_id, field, 1).await?;
        Ok(())
    }

    /// Full event log, oldest first
    pub async fn events_for(&self, partner_id: &str) -> Result<Vec<RatingEvent>, EngineError> {
        let mut events: Vec<RatingEvent> = self
            .store
            .zrange_json(&StoreKey::events(partner_id), i64::MIN, i64::MAX)
            .await?;
        sort_chronologically(&mut events);
        Ok(events)
    }

    /// Events at or after `since`, oldest first
    pub async fn events_since(
        &self,
        partner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RatingEvent>, EngineError> {
        let mut events: Vec<RatingEvent> = self
            .store
            .zrange_json(
                &StoreKey::events(partner_id),
                since.timestamp_millis(),
                i64::MAX,
            )
            .await?;
        sort_chronologically(&mut events);
        Ok(events)
    }
}

/// Zset scores are millisecond-resolution; break same-millisecond ties with
/// the event's own timestamp, then its id
fn sort_chronologically(events: &mut [RatingEvent]) {
    events.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Award the first not-yet-earned achievement in the chain
///
/// `award` returning false means "already earned, try the next milestone".
/// Errors end the chain; the event they belong to has already been written.
async fn apply_chain(
    tracker: Arc<AchievementTracker>,
    partner_id: String,
    chain: &'static [&'static str],
) {
    for achievement_id in chain {
        match tracker.award(&partner_id, achievement_id).await {
            Ok(true) => break,
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!(
                    partner_id = %partner_id,
                    achievement_id = %achievement_id,
                    error = %e,
                    "Achievement side effect failed"
                );
                break;
            }
        }
    }
}
