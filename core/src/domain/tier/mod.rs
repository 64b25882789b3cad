//! Tier progression
//!
//! The static tier table ([`rules`]), advancement checks against it
//! ([`eligibility`]), and the annual maintain-or-demote cycle ([`renewal`]).

pub mod eligibility;
pub mod renewal;
pub mod rules;

pub use eligibility::{
    EligibilityBlockers, MetricProgress, NextTierReport, TierEligibility, TierEligibilityEngine,
};
pub use renewal::{is_renewal_due, RenewalOutcome, RenewalProcessor, RenewalReport};
pub use rules::{requirements_for, TierRequirement, TIER_REQUIREMENTS};
