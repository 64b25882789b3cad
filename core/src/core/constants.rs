// =============================================================================
// Store Keys
// =============================================================================

/// Version prefix for every store key, bump on breaking layout changes
pub const STORE_KEY_VERSION: &str = "v1";

// =============================================================================
// Renewal
// =============================================================================

/// TTL of the per-partner renewal lease in seconds
///
/// A renewal run claims each due partner by writing a lease key with this TTL
/// before processing. Concurrent runs skip partners whose lease is held.
pub const RENEWAL_LEASE_TTL_SECS: u64 = 600;

/// Length of the renewal cycle in months
pub const RENEWAL_CYCLE_MONTHS: u32 = 12;
