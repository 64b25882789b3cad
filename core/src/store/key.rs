//! Type-safe store key builder with versioning

use crate::core::constants::STORE_KEY_VERSION;

/// Type-safe store key builder
///
/// All keys are prefixed with a version (e.g., "v1:") so a schema change can
/// invalidate the whole keyspace at once. Partner-scoped satellite keys embed
/// the partner id directly after the `partner:` segment, which lets a single
/// `delete_pattern("v1:partner:{id}:*")` sweep everything a partner owns.
pub struct StoreKey;

impl StoreKey {
    // =========================================================================
    // Partners
    // =========================================================================

    /// Key for the partner record itself
    pub fn partner(id: &str) -> String {
        format!("{}:partner:{}", STORE_KEY_VERSION, id)
    }

    /// Sorted set of all partner ids, scored by registration time (ms)
    pub fn partner_index() -> String {
        format!("{}:partners:index", STORE_KEY_VERSION)
    }

    // =========================================================================
    // Achievements
    // =========================================================================

    /// Hash of awarded achievements for a partner
    ///
    /// Non-repeatable awards use the achievement id as the field name;
    /// repeatable awards use `{id}#{seq}`.
    pub fn achievements(id: &str) -> String {
        format!("{}:partner:{}:achievements", STORE_KEY_VERSION, id)
    }

    /// Hash of per-achievement sequence counters for repeatable awards
    pub fn achievement_seq(id: &str) -> String {
        format!("{}:partner:{}:achievements:seq", STORE_KEY_VERSION, id)
    }

    // =========================================================================
    // Rating events
    // =========================================================================

    /// Sorted set of rating events for a partner, scored by creation time (ms)
    pub fn events(id: &str) -> String {
        format!("{}:partner:{}:events", STORE_KEY_VERSION, id)
    }

    /// Cached rating calculation for a partner (advisory, re-derivable)
    pub fn rating(id: &str) -> String {
        format!("{}:partner:{}:rating", STORE_KEY_VERSION, id)
    }

    // =========================================================================
    // Annual cycle
    // =========================================================================

    /// Hash of annual progress counters (reset at renewal)
    pub fn annual_progress(id: &str) -> String {
        format!("{}:partner:{}:annual", STORE_KEY_VERSION, id)
    }

    /// Short-lived lease taken while a renewal batch processes a partner
    pub fn renewal_lease(id: &str) -> String {
        format!("{}:partner:{}:renewal:lease", STORE_KEY_VERSION, id)
    }

    // =========================================================================
    // Deals and documents
    // =========================================================================

    /// Hash of deal records for a partner (field = deal id)
    pub fn deals(id: &str) -> String {
        format!("{}:partner:{}:deals", STORE_KEY_VERSION, id)
    }

    /// Hash of compliance document records for a partner (field = document id)
    pub fn documents(id: &str) -> String {
        format!("{}:partner:{}:documents", STORE_KEY_VERSION, id)
    }

    // =========================================================================
    // Tier history
    // =========================================================================

    /// Sorted set of tier changes for a partner, scored by change time (ms)
    pub fn tier_history(id: &str) -> String {
        format!("{}:partner:{}:tier:history", STORE_KEY_VERSION, id)
    }

    // =========================================================================
    // Remote configuration
    // =========================================================================

    /// Achievement catalog override document (read at startup/refresh)
    pub fn catalog_override() -> String {
        format!("{}:config:achievements", STORE_KEY_VERSION)
    }
}
