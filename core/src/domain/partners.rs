//! Partner directory
//!
//! Owns every write to the partner master record and its satellite keys:
//! registration, tier changes with history, deals, compliance documents, and
//! the per-cycle annual counters. All other services read partners through
//! this directory so record invariants live in one place.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::records::{
    AnnualMetrics, DealRecord, DocumentRecord, PartnerRecord, TierHistoryEntry,
};
use crate::domain::types::{PartnerTier, TierChangeReason};
use crate::error::EngineError;
use crate::store::{StoreKey, StoreService};

/// Annual counter fields tracked per renewal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnualField {
    Certifications,
    Opportunities,
    DealsWon,
}

impl AnnualField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certifications => "certifications",
            Self::Opportunities => "opportunities",
            Self::DealsWon => "deals_won",
        }
    }
}

/// Partner directory backed by the store
pub struct PartnerDirectory {
    store: Arc<StoreService>,
}

impl PartnerDirectory {
    pub fn new(store: Arc<StoreService>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Partner records
    // =========================================================================

    /// Register a partner
    ///
    /// Writes the record and adds the id to the partner index, scored by
    /// creation time. Re-registering an existing id overwrites the record.
    pub async fn register(&self, partner: &PartnerRecord) -> Result<(), EngineError> {
        self.store
            .set_json(&StoreKey::partner(&partner.id), partner, None)
            .await?;
        self.store
            .zadd_raw(
                &StoreKey::partner_index(),
                partner.created_at.timestamp_millis(),
                partner.id.as_bytes().to_vec(),
            )
            .await?;
        tracing::debug!(partner_id = %partner.id, name = %partner.name, "Partner registered");
        Ok(())
    }

    /// Get a partner, failing if it does not exist
    pub async fn get(&self, partner_id: &str) -> Result<PartnerRecord, EngineError> {
        self.try_get(partner_id)
            .await?
            .ok_or_else(|| EngineError::partner_not_found(partner_id))
    }

    /// Get a partner if it exists
    pub async fn try_get(&self, partner_id: &str) -> Result<Option<PartnerRecord>, EngineError> {
        Ok(self.store.get_json(&StoreKey::partner(partner_id)).await?)
    }

    /// All registered partner ids, in registration order
    pub async fn all_ids(&self) -> Result<Vec<String>, EngineError> {
        let members = self
            .store
            .zrange_raw(&StoreKey::partner_index(), i64::MIN, i64::MAX)
            .await?;
        let mut ids = Vec::with_capacity(members.len());
        for member in members {
            match String::from_utf8(member) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping non-UTF-8 partner index entry");
                }
            }
        }
        Ok(ids)
    }

    /// Remove a partner and every key scoped to it
    ///
    /// Admin/test operation. Returns whether the partner record existed.
    pub async fn remove(&self, partner_id: &str) -> Result<bool, EngineError> {
        let partner_key = StoreKey::partner(partner_id);
        // Satellite keys first, then the record, then the index entry
        self.store
            .delete_pattern(&format!("{partner_key}:*"))
            .await?;
        let existed = self.store.delete(&partner_key).await?;
        self.store
            .zrem_raw(&StoreKey::partner_index(), partner_id.as_bytes().to_vec())
            .await?;
        tracing::debug!(partner_id = %partner_id, existed, "Partner removed");
        Ok(existed)
    }

    // =========================================================================
    // Tier changes
    // =========================================================================

    /// Change a partner's tier, recording the change in the history log
    ///
    /// No-op when the tier is already the requested one.
    pub async fn set_tier(
        &self,
        partner_id: &str,
        tier: PartnerTier,
        reason: TierChangeReason,
    ) -> Result<(), EngineError> {
        let mut partner = self.get(partner_id).await?;
        if partner.tier == tier {
            return Ok(());
        }

        let previous = partner.tier;
        let now = Utc::now();
        partner.tier = tier;
        partner.updated_at = now;
        self.store
            .set_json(&StoreKey::partner(partner_id), &partner, None)
            .await?;
        self.push_tier_history(partner_id, tier, previous, reason, now)
            .await?;

        tracing::info!(
            partner_id = %partner_id,
            from = previous.as_str(),
            to = tier.as_str(),
            reason = reason.as_str(),
            "Partner tier changed"
        );
        Ok(())
    }

    /// Apply an annual renewal outcome to the partner record
    ///
    /// Sets the (possibly unchanged) tier, advances the cycle anchor, always
    /// appends a history entry, and zeroes the annual counters. Returns the
    /// tier held before the renewal.
    pub(crate) async fn complete_renewal(
        &self,
        partner_id: &str,
        new_tier: PartnerTier,
        now: DateTime<Utc>,
    ) -> Result<PartnerTier, EngineError> {
        let mut partner = self.get(partner_id).await?;
        let previous = partner.tier;

        partner.tier = new_tier;
        partner.last_renewal_at = Some(now);
        partner.updated_at = now;
        self.store
            .set_json(&StoreKey::partner(partner_id), &partner, None)
            .await?;
        // Renewal history entries are recorded even when the tier is kept
        self.push_tier_history(
            partner_id,
            new_tier,
            previous,
            TierChangeReason::AnnualRenewal,
            now,
        )
        .await?;
        self.reset_annual(partner_id).await?;

        Ok(previous)
    }

    async fn push_tier_history(
        &self,
        partner_id: &str,
        tier: PartnerTier,
        previous_tier: PartnerTier,
        reason: TierChangeReason,
        changed_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let entry = TierHistoryEntry {
            partner_id: partner_id.to_string(),
            tier,
            previous_tier,
            reason,
            changed_at,
        };
        self.store
            .zadd_json(
                &StoreKey::tier_history(partner_id),
                changed_at.timestamp_millis(),
                &entry,
            )
            .await?;
        Ok(())
    }

    /// Tier change history, oldest first
    pub async fn tier_history(
        &self,
        partner_id: &str,
    ) -> Result<Vec<TierHistoryEntry>, EngineError> {
        let mut entries: Vec<TierHistoryEntry> = self
            .store
            .zrange_json(&StoreKey::tier_history(partner_id), i64::MIN, i64::MAX)
            .await?;
        // Zset scores are millisecond-resolution; break same-millisecond
        // ties with the entry's own timestamp
        entries.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(entries)
    }

    // =========================================================================
    // Deals and documents
    // =========================================================================

    /// Record or update a deal
    pub async fn record_deal(&self, deal: &DealRecord) -> Result<(), EngineError> {
        self.store
            .hset_json(&StoreKey::deals(&deal.partner_id), &deal.id, deal)
            .await?;
        tracing::debug!(
            partner_id = %deal.partner_id,
            deal_id = %deal.id,
            status = deal.status.as_str(),
            "Deal recorded"
        );
        Ok(())
    }

    /// All deals for a partner, oldest first
    pub async fn deals_for(&self, partner_id: &str) -> Result<Vec<DealRecord>, EngineError> {
        let mut deals: Vec<DealRecord> = self
            .store
            .hget_all_json(&StoreKey::deals(partner_id))
            .await?
            .into_iter()
            .map(|(_, deal)| deal)
            .collect();
        deals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(deals)
    }

    /// Record or update a compliance document
    pub async fn upsert_document(&self, doc: &DocumentRecord) -> Result<(), EngineError> {
        self.store
            .hset_json(&StoreKey::documents(&doc.partner_id), &doc.id, doc)
            .await?;
        Ok(())
    }

    /// All compliance documents for a partner, by id
    pub async fn documents_for(
        &self,
        partner_id: &str,
    ) -> Result<Vec<DocumentRecord>, EngineError> {
        let mut docs: Vec<DocumentRecord> = self
            .store
            .hget_all_json(&StoreKey::documents(partner_id))
            .await?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    // =========================================================================
    // Annual counters
    // =========================================================================

    /// Current annual counters (absent fields read as zero)
    pub async fn annual_metrics(&self, partner_id: &str) -> Result<AnnualMetrics, EngineError> {
        let fields = self
            .store
            .hget_all_raw(&StoreKey::annual_progress(partner_id))
            .await?;
        let mut metrics = AnnualMetrics::default();
        for (field, raw) in fields {
            let value = parse_counter(&raw);
            match field.as_str() {
                "certifications" => metrics.certifications = value,
                "opportunities" => metrics.opportunities = value,
                "deals_won" => metrics.deals_won = value,
                other => {
                    tracing::warn!(partner_id = %partner_id, field = %other, "Unknown annual counter field");
                }
            }
        }
        Ok(metrics)
    }

    /// Atomically increment one annual counter, returning the new value
    pub async fn bump_annual(
        &self,
        partner_id: &str,
        field: AnnualField,
        by: u32,
    ) -> Result<u32, EngineError> {
        let value = self
            .store
            .hincr_by(
                &StoreKey::annual_progress(partner_id),
                field.as_str(),
                i64::from(by),
            )
            .await?;
        Ok(value.max(0).try_into().unwrap_or(u32::MAX))
    }

    /// Reset every annual counter to zero
    pub async fn reset_annual(&self, partner_id: &str) -> Result<(), EngineError> {
        self.store
            .delete(&StoreKey::annual_progress(partner_id))
            .await?;
        Ok(())
    }
}

/// Counter bytes parse as base-10 integers; anything else (or a negative)
/// reads as zero
fn parse_counter(raw: &[u8]) -> u32 {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|n| n.try_into().ok())
        .unwrap_or(0)
}
