//! Annual renewal
//!
//! Once per twelve-month cycle a partner's tier is re-earned: the annual
//! counters are checked against the quotas of the tier currently held, the
//! tier is kept or dropped one level, the counters are zeroed, and the cycle
//! anchor advances. Renewal only maintains or demotes; promotion happens
//! through ratings and eligibility, never here.
//!
//! Batch sweeps take a short per-partner lease in the store so overlapping
//! runs skip partners another run already picked up.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::core::constants::{RENEWAL_CYCLE_MONTHS, RENEWAL_LEASE_TTL_SECS};
use crate::domain::partners::PartnerDirectory;
use crate::domain::records::PartnerRecord;
use crate::domain::tier::rules::requirements_for;
use crate::domain::types::PartnerTier;
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// What one renewal did to one partner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenewalOutcome {
    pub partner_id: String,
    pub previous_tier: PartnerTier,
    pub tier: PartnerTier,
    pub downgraded: bool,
    pub renewed_at: DateTime<Utc>,
}

/// Tally of a batch renewal sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenewalReport {
    pub processed: u32,
    /// Always 0; renewal never promotes
    pub upgraded: u32,
    pub downgraded: u32,
    pub maintained: u32,
    pub errors: u32,
}

// ============================================================================
// DUE-DATE CHECK
// ============================================================================

/// Has the partner's current twelve-month cycle elapsed?
///
/// The cycle starts at the last renewal, or at registration if the partner
/// has never renewed. An anchor date that cannot be advanced by twelve
/// months is treated as not due.
pub fn is_renewal_due(partner: &PartnerRecord, now: DateTime<Utc>) -> bool {
    let cycle_start = partner.last_renewal_at.unwrap_or(partner.created_at);
    match cycle_start.checked_add_months(Months::new(RENEWAL_CYCLE_MONTHS)) {
        Some(next_renewal) => now >= next_renewal,
        None => false,
    }
}

// ============================================================================
// RENEWAL PROCESSOR
// ============================================================================

/// Applies annual maintain-or-demote decisions
pub struct RenewalProcessor {
    directory: Arc<PartnerDirectory>,
    store: Arc<StoreService>,
}

impl RenewalProcessor {
    pub fn new(directory: Arc<PartnerDirectory>, store: Arc<StoreService>) -> Self {
        Self { directory, store }
    }

    /// Renew one partner as of `now`
    ///
    /// The partner keeps their tier when the annual counters meet the quotas
    /// of the tier they hold, and drops exactly one level when they do not.
    /// Bronze has no quotas and is never demoted. Either way the counters
    /// reset, the cycle anchor advances, and a history entry is written.
    pub async fn process_renewal(
        &self,
        partner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RenewalOutcome, EngineError> {
        let partner = self.directory.get(partner_id).await?;
        let required = requirements_for(partner.tier).annual;
        let metrics = self.directory.annual_metrics(partner_id).await?;

        let keeps_tier = partner.tier == PartnerTier::Bronze || metrics.meets(&required);
        let new_tier = if keeps_tier {
            partner.tier
        } else {
            partner.tier.previous().unwrap_or(PartnerTier::Bronze)
        };

        let previous_tier = self
            .directory
            .complete_renewal(partner_id, new_tier, now)
            .await?;
        let downgraded = new_tier < previous_tier;

        tracing::info!(
            partner_id = %partner_id,
            previous_tier = %previous_tier.as_str(),
            tier = %new_tier.as_str(),
            downgraded,
            "Annual renewal processed"
        );

        Ok(RenewalOutcome {
            partner_id: partner_id.to_string(),
            previous_tier,
            tier: new_tier,
            downgraded,
            renewed_at: now,
        })
    }

    /// Renew every partner whose cycle has elapsed
    ///
    /// Partners not yet due are passed over silently. A partner that fails to
    /// load, fails to lease, or fails to renew is counted in `errors` and the
    /// sweep moves on.
    pub async fn process_all_due(&self, now: DateTime<Utc>) -> Result<RenewalReport, EngineError> {
        let mut report = RenewalReport::default();

        for partner_id in self.directory.all_ids().await? {
            let partner = match self.directory.try_get(&partner_id).await {
                Ok(Some(partner)) => partner,
                Ok(None) => {
                    tracing::warn!(
                        partner_id = %partner_id,
                        "Indexed partner has no record, skipping renewal"
                    );
                    report.errors += 1;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        partner_id = %partner_id,
                        error = %err,
                        "Failed to load partner for renewal"
                    );
                    report.errors += 1;
                    continue;
                }
            };
            if !is_renewal_due(&partner, now) {
                continue;
            }

            match self
                .store
                .set_nx_raw(
                    &StoreKey::renewal_lease(&partner_id),
                    now.timestamp_millis().to_string().into_bytes(),
                    Some(Duration::from_secs(RENEWAL_LEASE_TTL_SECS)),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(
                        partner_id = %partner_id,
                        "Renewal already leased, skipping"
                    );
                    continue;
                }
                Err(err) => {
                    tracing::warn!(
                        partner_id = %partner_id,
                        error = %err,
                        "Failed to take renewal lease"
                    );
                    report.errors += 1;
                    continue;
                }
            }

            match self.process_renewal(&partner_id, now).await {
                Ok(outcome) => {
                    report.processed += 1;
                    if outcome.downgraded {
                        report.downgraded += 1;
                    } else {
                        report.maintained += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        partner_id = %partner_id,
                        error = %err,
                        "Renewal failed"
                    );
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            downgraded = report.downgraded,
            maintained = report.maintained,
            errors = report.errors,
            "Renewal sweep complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StoreConfig;
    use crate::domain::partners::AnnualField;
    use crate::domain::types::TierChangeReason;
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        store: Arc<StoreService>,
        directory: Arc<PartnerDirectory>,
        processor: RenewalProcessor,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(StoreService::new(&StoreConfig::default()).await.unwrap());
        let directory = Arc::new(PartnerDirectory::new(Arc::clone(&store)));
        let processor = RenewalProcessor::new(Arc::clone(&directory), Arc::clone(&store));
        Fixture {
            store,
            directory,
            processor,
        }
    }

    fn partner_aged(id: &str, tier: PartnerTier, age_days: i64) -> PartnerRecord {
        let mut record = PartnerRecord::new(id, "Acme Corp", Utc::now() - ChronoDuration::days(age_days));
        record.tier = tier;
        record
    }

    #[test]
    fn test_renewal_due_boundary() {
        let now = Utc::now();

        let fresh = PartnerRecord::new("p1", "Acme Corp", now - ChronoDuration::days(300));
        assert!(!is_renewal_due(&fresh, now));

        let aged = PartnerRecord::new("p1", "Acme Corp", now - ChronoDuration::days(366));
        assert!(is_renewal_due(&aged, now));

        // A recent renewal restarts the cycle regardless of registration age
        let mut renewed = PartnerRecord::new("p1", "Acme Corp", now - ChronoDuration::days(900));
        renewed.last_renewal_at = Some(now - ChronoDuration::days(1));
        assert!(!is_renewal_due(&renewed, now));
    }

    #[tokio::test]
    async fn test_demotes_one_level_when_quotas_unmet() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Gold, 366))
            .await
            .unwrap();
        // Gold quotas are 2 certifications / 2 opportunities / 1 deal won;
        // one certification short
        f.directory
            .bump_annual("p1", AnnualField::Certifications, 1)
            .await
            .unwrap();
        f.directory
            .bump_annual("p1", AnnualField::Opportunities, 3)
            .await
            .unwrap();
        f.directory
            .bump_annual("p1", AnnualField::DealsWon, 2)
            .await
            .unwrap();

        let now = Utc::now();
        let outcome = f.processor.process_renewal("p1", now).await.unwrap();
        assert_eq!(outcome.previous_tier, PartnerTier::Gold);
        assert_eq!(outcome.tier, PartnerTier::Silver);
        assert!(outcome.downgraded);

        let partner = f.directory.get("p1").await.unwrap();
        assert_eq!(partner.tier, PartnerTier::Silver);
        assert_eq!(partner.last_renewal_at, Some(now));

        let history = f.directory.tier_history("p1").await.unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.tier, PartnerTier::Silver);
        assert_eq!(last.previous_tier, PartnerTier::Gold);
        assert_eq!(last.reason, TierChangeReason::AnnualRenewal);

        let metrics = f.directory.annual_metrics("p1").await.unwrap();
        assert_eq!(metrics.certifications, 0);
        assert_eq!(metrics.opportunities, 0);
        assert_eq!(metrics.deals_won, 0);
    }

    #[tokio::test]
    async fn test_platinum_failure_drops_to_gold_only() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Platinum, 400))
            .await
            .unwrap();

        let outcome = f.processor.process_renewal("p1", Utc::now()).await.unwrap();
        assert_eq!(outcome.tier, PartnerTier::Gold);
        assert!(outcome.downgraded);
    }

    #[tokio::test]
    async fn test_bronze_is_never_demoted() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Bronze, 400))
            .await
            .unwrap();

        let outcome = f.processor.process_renewal("p1", Utc::now()).await.unwrap();
        assert_eq!(outcome.tier, PartnerTier::Bronze);
        assert!(!outcome.downgraded);

        // Maintained renewals still leave a history entry
        let history = f.directory.tier_history("p1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, TierChangeReason::AnnualRenewal);
    }

    #[tokio::test]
    async fn test_met_quotas_maintain_tier_and_reset_counters() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Silver, 366))
            .await
            .unwrap();
        f.directory
            .bump_annual("p1", AnnualField::Certifications, 1)
            .await
            .unwrap();
        f.directory
            .bump_annual("p1", AnnualField::Opportunities, 1)
            .await
            .unwrap();

        let outcome = f.processor.process_renewal("p1", Utc::now()).await.unwrap();
        assert_eq!(outcome.tier, PartnerTier::Silver);
        assert!(!outcome.downgraded);

        let metrics = f.directory.annual_metrics("p1").await.unwrap();
        assert_eq!(metrics.certifications, 0);
        assert_eq!(metrics.opportunities, 0);
    }

    #[tokio::test]
    async fn test_unknown_partner_fails() {
        let f = fixture().await;
        let err = f
            .processor
            .process_renewal("ghost", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PartnerNotFound { .. }));
    }

    #[tokio::test]
    async fn test_sweep_processes_only_due_partners() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("old", PartnerTier::Bronze, 366))
            .await
            .unwrap();
        f.directory
            .register(&partner_aged("new", PartnerTier::Bronze, 10))
            .await
            .unwrap();

        let report = f.processor.process_all_due(Utc::now()).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.maintained, 1);
        assert_eq!(report.upgraded, 0);
        assert_eq!(report.errors, 0);

        assert!(f.directory.get("old").await.unwrap().last_renewal_at.is_some());
        assert!(f.directory.get("new").await.unwrap().last_renewal_at.is_none());

        // The renewal restarted the cycle; an immediate second sweep is a no-op
        let again = f.processor.process_all_due(Utc::now()).await.unwrap();
        assert_eq!(again.processed, 0);
    }

    #[tokio::test]
    async fn test_sweep_respects_existing_lease() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Bronze, 366))
            .await
            .unwrap();
        let leased = f
            .store
            .set_nx_raw(
                &StoreKey::renewal_lease("p1"),
                b"held".to_vec(),
                Some(Duration::from_secs(RENEWAL_LEASE_TTL_SECS)),
            )
            .await
            .unwrap();
        assert!(leased);

        let report = f.processor.process_all_due(Utc::now()).await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.errors, 0);
        assert!(f.directory.get("p1").await.unwrap().last_renewal_at.is_none());
    }

    #[tokio::test]
    async fn test_sweep_isolates_broken_partner() {
        let f = fixture().await;
        f.directory
            .register(&partner_aged("p1", PartnerTier::Bronze, 366))
            .await
            .unwrap();
        // Index entry with no backing record
        f.store
            .zadd_raw(&StoreKey::partner_index(), 0, b"ghost".to_vec())
            .await
            .unwrap();

        let report = f.processor.process_all_due(Utc::now()).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.errors, 1);
    }
}
