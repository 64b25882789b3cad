//! Rating factor formulas
//!
//! Pure functions over loaded records. Every factor lands in [0, 100]; the
//! weighted combination happens in the rating service.

use crate::domain::records::{DealRecord, DocumentRecord, RatingEvent};
use crate::domain::types::{DealStatus, RatingEventType};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Trailing window the engagement factor (and its inactivity signal) looks at
pub(crate) const ENGAGEMENT_WINDOW_DAYS: i64 = 30;

/// Deal quality with no deals on record
const NEUTRAL_DEAL_QUALITY: f64 = 50.0;

/// Engagement baseline before activity modifiers
const ENGAGEMENT_BASE: f64 = 50.0;
/// Per copilot session, capped
const COPILOT_SESSION_POINTS: f64 = 5.0;
const COPILOT_SESSION_CAP: f64 = 25.0;
/// Per completed training module, capped
const TRAINING_MODULE_POINTS: f64 = 10.0;
const TRAINING_MODULE_CAP: f64 = 20.0;
/// Per inactivity signal in the window, uncapped
const INACTIVITY_PENALTY: f64 = 10.0;

/// Revenue with no won deals on record
const NO_WON_DEALS_REVENUE: f64 = 30.0;
/// Per won deal, capped
const WON_DEAL_POINTS: f64 = 15.0;
const WON_DEAL_CAP: f64 = 70.0;

// ============================================================================
// FACTORS
// ============================================================================

/// Deal quality over the partner's lifetime deals
///
/// `40 x approval_rate + 40 x win_rate + 20 x lead_rate`; a partner with no
/// deals scores a neutral 50.
pub fn deal_quality(deals: &[DealRecord]) -> f64 {
    if deals.is_empty() {
        return NEUTRAL_DEAL_QUALITY;
    }

    let total = deals.len() as f64;
    let approved = deals.iter().filter(|d| d.status.counts_as_approved()).count() as f64;
    let won = deals.iter().filter(|d| d.status == DealStatus::Won).count() as f64;
    let lost = deals.iter().filter(|d| d.status == DealStatus::Lost).count() as f64;
    let partner_generated = deals.iter().filter(|d| d.partner_generated).count() as f64;

    let approval_rate = approved / total;
    let win_rate = if won + lost == 0.0 {
        0.0
    } else {
        won / (won + lost)
    };
    let lead_rate = partner_generated / total;

    clamp_score(40.0 * approval_rate + 40.0 * win_rate + 20.0 * lead_rate)
}

/// Engagement over the trailing 30-day event window
///
/// Base 50, bumped by copilot sessions and training completions (each
/// capped) and docked 10 per inactivity signal.
pub fn engagement(events_last_30d: &[RatingEvent]) -> f64 {
    let mut copilot = 0.0;
    let mut training = 0.0;
    let mut penalty = 0.0;
    for event in events_last_30d {
        match event.event_type {
            RatingEventType::CopilotSessionCompleted => copilot += COPILOT_SESSION_POINTS,
            RatingEventType::TrainingModuleCompleted => training += TRAINING_MODULE_POINTS,
            RatingEventType::LoginInactive30Days => penalty += INACTIVITY_PENALTY,
            _ => {}
        }
    }
    clamp_score(
        ENGAGEMENT_BASE + copilot.min(COPILOT_SESSION_CAP) + training.min(TRAINING_MODULE_CAP)
            - penalty,
    )
}

/// Certification coverage from the full event log
///
/// Active certifications = earned minus expired, floored at zero, then a
/// step function: 0 -> 20, 1 -> 60, 2 -> 80, 3+ -> 100.
pub fn certification(events: &[RatingEvent]) -> f64 {
    let earned = events
        .iter()
        .filter(|e| e.event_type == RatingEventType::CertificationEarned)
        .count();
    let expired = events
        .iter()
        .filter(|e| e.event_type == RatingEventType::CertificationExpired)
        .count();

    match earned.saturating_sub(expired) {
        0 => 20.0,
        1 => 60.0,
        2 => 80.0,
        _ => 100.0,
    }
}

/// Compliance as the signed share of required documents
///
/// A partner with no required documents is fully compliant.
pub fn compliance(documents: &[DocumentRecord]) -> f64 {
    let required = documents.iter().filter(|d| d.required).count();
    if required == 0 {
        return 100.0;
    }
    let signed_required = documents.iter().filter(|d| d.required && d.signed).count();
    clamp_score((signed_required as f64 / required as f64) * 100.0)
}

/// Revenue contribution from won deals
///
/// 15 per won deal up to 70, plus a bonus keyed on the average population of
/// won deals that carry one. No won deals scores 30.
pub fn revenue(deals: &[DealRecord]) -> f64 {
    let won: Vec<&DealRecord> = deals
        .iter()
        .filter(|d| d.status == DealStatus::Won)
        .collect();
    if won.is_empty() {
        return NO_WON_DEALS_REVENUE;
    }

    let base = (won.len() as f64 * WON_DEAL_POINTS).min(WON_DEAL_CAP);

    let populations: Vec<u64> = won.iter().filter_map(|d| d.population).collect();
    let average = if populations.is_empty() {
        0.0
    } else {
        populations.iter().sum::<u64>() as f64 / populations.len() as f64
    };
    let bonus = if average >= 1_000_000.0 {
        30.0
    } else if average >= 500_000.0 {
        20.0
    } else if average >= 100_000.0 {
        10.0
    } else {
        0.0
    };

    clamp_score(base + bonus)
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn deal(status: DealStatus, partner_generated: bool, population: Option<u64>) -> DealRecord {
        DealRecord {
            id: "d".to_string(),
            partner_id: "p1".to_string(),
            status,
            partner_generated,
            population,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    fn event(event_type: RatingEventType) -> RatingEvent {
        RatingEvent {
            id: "e".to_string(),
            partner_id: "p1".to_string(),
            user_id: "u1".to_string(),
            event_type,
            points: event_type.points(),
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    fn doc(required: bool, signed: bool) -> DocumentRecord {
        DocumentRecord {
            id: "doc".to_string(),
            partner_id: "p1".to_string(),
            name: "Agreement".to_string(),
            required,
            signed,
            signed_at: None,
        }
    }

    #[test]
    fn test_deal_quality_no_deals_is_neutral() {
        assert_eq!(deal_quality(&[]), 50.0);
    }

    #[test]
    fn test_deal_quality_perfect_partner() {
        let deals = vec![deal(DealStatus::Won, true, None)];
        // approval 1.0, win 1.0, lead 1.0
        assert_eq!(deal_quality(&deals), 100.0);
    }

    #[test]
    fn test_deal_quality_mixed() {
        let deals = vec![
            deal(DealStatus::Won, true, None),
            deal(DealStatus::Lost, false, None),
            deal(DealStatus::Submitted, false, None),
            deal(DealStatus::Approved, true, None),
        ];
        // approval 3/4 -> 30, win 1/2 -> 20, lead 2/4 -> 10
        assert_eq!(deal_quality(&deals), 60.0);
    }

    #[test]
    fn test_deal_quality_no_closed_deals_has_zero_win_rate() {
        let deals = vec![
            deal(DealStatus::Approved, false, None),
            deal(DealStatus::Submitted, false, None),
        ];
        // approval 1/2 -> 20, win 0, lead 0
        assert_eq!(deal_quality(&deals), 20.0);
    }

    #[test]
    fn test_engagement_no_events_is_base() {
        assert_eq!(engagement(&[]), 50.0);
    }

    #[test]
    fn test_engagement_caps_both_bonuses() {
        let mut events = Vec::new();
        for _ in 0..10 {
            events.push(event(RatingEventType::CopilotSessionCompleted));
        }
        for _ in 0..5 {
            events.push(event(RatingEventType::TrainingModuleCompleted));
        }
        // 50 + capped 25 + capped 20
        assert_eq!(engagement(&events), 95.0);
    }

    #[test]
    fn test_engagement_inactivity_penalty() {
        let events = vec![event(RatingEventType::LoginInactive30Days)];
        assert_eq!(engagement(&events), 40.0);

        let many: Vec<RatingEvent> = (0..6)
            .map(|_| event(RatingEventType::LoginInactive30Days))
            .collect();
        // 50 - 60, clamped
        assert_eq!(engagement(&many), 0.0);
    }

    #[test]
    fn test_engagement_ignores_unrelated_events() {
        let events = vec![
            event(RatingEventType::DealClosedWon),
            event(RatingEventType::DocumentSigned),
        ];
        assert_eq!(engagement(&events), 50.0);
    }

    #[test]
    fn test_certification_steps() {
        assert_eq!(certification(&[]), 20.0);

        let one = vec![event(RatingEventType::CertificationEarned)];
        assert_eq!(certification(&one), 60.0);

        let two: Vec<RatingEvent> = (0..2)
            .map(|_| event(RatingEventType::CertificationEarned))
            .collect();
        assert_eq!(certification(&two), 80.0);

        let five: Vec<RatingEvent> = (0..5)
            .map(|_| event(RatingEventType::CertificationEarned))
            .collect();
        assert_eq!(certification(&five), 100.0);
    }

    #[test]
    fn test_certification_expiry_reduces_active_count() {
        let events = vec![
            event(RatingEventType::CertificationEarned),
            event(RatingEventType::CertificationEarned),
            event(RatingEventType::CertificationEarned),
            event(RatingEventType::CertificationExpired),
        ];
        assert_eq!(certification(&events), 80.0);

        // More expiries than earns floors at zero active
        let inverted = vec![
            event(RatingEventType::CertificationEarned),
            event(RatingEventType::CertificationExpired),
            event(RatingEventType::CertificationExpired),
        ];
        assert_eq!(certification(&inverted), 20.0);
    }

    #[test]
    fn test_compliance_no_required_is_full() {
        assert_eq!(compliance(&[]), 100.0);
        assert_eq!(compliance(&[doc(false, false)]), 100.0);
    }

    #[test]
    fn test_compliance_signed_share() {
        let docs = vec![doc(true, true), doc(true, false)];
        assert_eq!(compliance(&docs), 50.0);

        // Signing optional documents earns nothing
        let optional_signed = vec![doc(true, false), doc(false, true)];
        assert_eq!(compliance(&optional_signed), 0.0);
    }

    #[test]
    fn test_revenue_no_won_deals() {
        assert_eq!(revenue(&[]), 30.0);
        let unclosed = vec![deal(DealStatus::Approved, false, Some(2_000_000))];
        assert_eq!(revenue(&unclosed), 30.0);
    }

    #[test]
    fn test_revenue_base_points_and_cap() {
        let one = vec![deal(DealStatus::Won, false, None)];
        assert_eq!(revenue(&one), 15.0);

        let six: Vec<DealRecord> = (0..6).map(|_| deal(DealStatus::Won, false, None)).collect();
        // 90 capped at 70, no populations
        assert_eq!(revenue(&six), 70.0);
    }

    #[test]
    fn test_revenue_population_bonus_tiers() {
        let small = vec![deal(DealStatus::Won, false, Some(100_000))];
        assert_eq!(revenue(&small), 25.0);

        let medium = vec![deal(DealStatus::Won, false, Some(600_000))];
        assert_eq!(revenue(&medium), 35.0);

        let large = vec![
            deal(DealStatus::Won, false, Some(1_500_000)),
            deal(DealStatus::Won, false, Some(900_000)),
        ];
        // avg 1.2M: 30 base + 30 bonus
        assert_eq!(revenue(&large), 60.0);
    }

    #[test]
    fn test_revenue_ignores_deals_without_population_in_average() {
        let deals = vec![
            deal(DealStatus::Won, false, Some(1_200_000)),
            deal(DealStatus::Won, false, None),
        ];
        // avg over the one known population stays >= 1M
        assert_eq!(revenue(&deals), 60.0);
    }

    #[test]
    fn test_factors_stay_in_bounds() {
        let five_won_large: Vec<DealRecord> = (0..5)
            .map(|_| deal(DealStatus::Won, true, Some(5_000_000)))
            .collect();
        assert_eq!(revenue(&five_won_large), 100.0);
        assert!(deal_quality(&five_won_large) <= 100.0);
    }
}
