//! # Autopilot Decisions
//!
//! The per-order decision behind the collections autopilot. Given one order,
//! the clock and the time of the last message sent about that order, decide
//! what (if anything) should happen. Nothing here sends or stores; the
//! caller receives an intent and carries it out.
//!
//! ## Branches
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate_protection(order, now, grace)                                 │
//! │       │                                                                 │
//! │       ├── WithinGrace ──► spacing ≥ warning_spacing_hours?              │
//! │       │                     yes → GraceWarning (tone = count mod 4)     │
//! │       │                                                                 │
//! │       ├── GraceExpired ─► Lapse (always; snapshot + one-time notice)    │
//! │       │                                                                 │
//! │       ├── Lapsed ───────► spacing ≥ follow_up_interval_days?            │
//! │       │                     yes → DynamicQuote (hypothetical reprice)   │
//! │       │                                                                 │
//! │       └── NotDue / NotApplicable ──► nothing                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The three acting branches come from one `ProtectionCheck`, so an order
//! matches at most one of them per cycle. Repeat suppression relies only on
//! `last_outbound`, which the caller reads from real message history.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::messages::{self, OutboundMessage};
use crate::protection::{evaluate_protection, lapse_protection, ProtectionCheck};
use crate::repricing::{quote_at_rate, RepriceQuote};
use crate::types::{Order, SnapshotReason, StoreSettings};

/// Tone of a grace-period warning. Rotates every four sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Gentle,
    Firm,
    Urgent,
    Final,
}

impl WarningLevel {
    /// Picks the tone for a milestone that has had `warning_count` warnings.
    pub fn from_count(warning_count: u32) -> Self {
        match warning_count % 4 {
            0 => WarningLevel::Gentle,
            1 => WarningLevel::Firm,
            2 => WarningLevel::Urgent,
            _ => WarningLevel::Final,
        }
    }
}

impl std::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningLevel::Gentle => write!(f, "gentle"),
            WarningLevel::Firm => write!(f, "firm"),
            WarningLevel::Urgent => write!(f, "urgent"),
            WarningLevel::Final => write!(f, "final"),
        }
    }
}

/// What the autopilot wants done with one order.
#[derive(Debug, Clone, PartialEq)]
pub enum AutopilotDecision {
    /// Send a reminder; bump the milestone's warning count once it is sent.
    GraceWarning {
        order_id: String,
        milestone_id: String,
        level: WarningLevel,
        message: OutboundMessage,
    },
    /// Commit `order` (already LAPSED with its snapshot), then notify.
    Lapse {
        order: Order,
        message: OutboundMessage,
    },
    /// Send a hypothetical quote. The order itself is not changed.
    DynamicQuote {
        order_id: String,
        quote: RepriceQuote,
        message: OutboundMessage,
    },
}

impl AutopilotDecision {
    pub fn order_id(&self) -> &str {
        match self {
            AutopilotDecision::GraceWarning { order_id, .. } => order_id,
            AutopilotDecision::Lapse { order, .. } => &order.id,
            AutopilotDecision::DynamicQuote { order_id, .. } => order_id,
        }
    }

    pub fn message(&self) -> &OutboundMessage {
        match self {
            AutopilotDecision::GraceWarning { message, .. }
            | AutopilotDecision::Lapse { message, .. }
            | AutopilotDecision::DynamicQuote { message, .. } => message,
        }
    }
}

/// Returns true if at least `gap` has passed since `last`, or there was no
/// previous message.
fn spaced(last: Option<DateTime<Utc>>, now: DateTime<Utc>, gap: Duration) -> bool {
    match last {
        Some(sent_at) => now - sent_at >= gap,
        None => true,
    }
}

/// Decides the autopilot action for `order`.
///
/// `last_outbound` is when the most recent message about this order went
/// out, if ever.
///
/// ## Errors
/// A lapsed order is due a quote but the current rate cannot be priced.
pub fn decide(
    order: &Order,
    now: DateTime<Utc>,
    last_outbound: Option<DateTime<Utc>>,
    settings: &StoreSettings,
) -> CoreResult<Option<AutopilotDecision>> {
    match evaluate_protection(order, now, settings.grace_period_hours) {
        ProtectionCheck::NotApplicable | ProtectionCheck::NotDue => Ok(None),

        ProtectionCheck::WithinGrace {
            milestone_id,
            overdue_hours,
        } => {
            let spacing = Duration::hours(i64::from(settings.warning_spacing_hours));
            if !spaced(last_outbound, now, spacing) {
                return Ok(None);
            }

            let Some(milestone) = order.plan.milestones.iter().find(|m| m.id == milestone_id)
            else {
                return Ok(None);
            };
            let level = WarningLevel::from_count(milestone.warning_count);
            let hours_left = i64::from(settings.grace_period_hours) - overdue_hours;
            let message = messages::grace_warning(order, milestone, level, hours_left);

            Ok(Some(AutopilotDecision::GraceWarning {
                order_id: order.id.clone(),
                milestone_id,
                level,
                message,
            }))
        }

        ProtectionCheck::GraceExpired { .. } => {
            let lapsed = lapse_protection(order, SnapshotReason::GracePeriodExpired, now);
            let message = messages::protection_lapsed(&lapsed);
            Ok(Some(AutopilotDecision::Lapse {
                order: lapsed,
                message,
            }))
        }

        ProtectionCheck::Lapsed => {
            let interval = Duration::days(i64::from(settings.follow_up_interval_days));
            if !spaced(last_outbound, now, interval) {
                return Ok(None);
            }

            let quote = quote_at_rate(order, settings.current_gold_rate_24k, settings)?;
            let message = messages::dynamic_quote(order, &quote);
            Ok(Some(AutopilotDecision::DynamicQuote {
                order_id: order.id.clone(),
                quote,
                message,
            }))
        }
    }
}

/// Advances the warning rotation of one milestone after a confirmed send.
pub fn record_warning_sent(order: &Order, milestone_id: &str) -> CoreResult<Order> {
    let mut updated = order.clone();
    let milestone = updated
        .plan
        .milestones
        .iter_mut()
        .find(|m| m.id == milestone_id)
        .ok_or_else(|| CoreError::MilestoneNotFound {
            order_id: order.id.clone(),
            milestone_id: milestone_id.to_string(),
        })?;

    milestone.warning_count += 1;
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageKind;
    use crate::order::{build_order, OrderDraft};
    use crate::testing::{priced_order, sample_order, settings};
    use crate::types::{OrderStatus, ProtectionStatus};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_level_rotation() {
        assert_eq!(WarningLevel::from_count(0), WarningLevel::Gentle);
        assert_eq!(WarningLevel::from_count(3), WarningLevel::Final);
        assert_eq!(WarningLevel::from_count(4), WarningLevel::Gentle);
        assert_eq!(WarningLevel::from_count(6), WarningLevel::Urgent);
    }

    #[test]
    fn test_not_due_does_nothing() {
        let order = sample_order();
        let decision = decide(&order, at(9, 12), None, &settings()).unwrap();
        assert!(decision.is_none());
    }

    #[test]
    fn test_grace_warning_respects_spacing() {
        let order = sample_order();
        let now = at(10, 8);

        let decision = decide(&order, now, Some(at(10, 5)), &settings()).unwrap();
        assert!(decision.is_none());

        let decision = decide(&order, now, Some(at(10, 4)), &settings()).unwrap();
        match decision {
            Some(AutopilotDecision::GraceWarning {
                milestone_id,
                level,
                message,
                ..
            }) => {
                assert_eq!(milestone_id, "MS-00");
                assert_eq!(level, WarningLevel::Gentle);
                assert_eq!(message.kind, MessageKind::GraceWarning);
            }
            other => panic!("expected a grace warning, got {:?}", other),
        }
    }

    #[test]
    fn test_warning_count_drives_tone() {
        let order = sample_order();
        let warned = record_warning_sent(&order, "MS-00").unwrap();
        let warned = record_warning_sent(&warned, "MS-00").unwrap();
        assert_eq!(warned.plan.milestones[0].warning_count, 2);
        assert_eq!(order.plan.milestones[0].warning_count, 0);

        let decision = decide(&warned, at(10, 8), None, &settings()).unwrap().unwrap();
        assert!(matches!(
            decision,
            AutopilotDecision::GraceWarning {
                level: WarningLevel::Urgent,
                ..
            }
        ));

        assert!(matches!(
            record_warning_sent(&order, "MS-99"),
            Err(CoreError::MilestoneNotFound { .. })
        ));
    }

    #[test]
    fn test_fully_credited_order_is_left_alone() {
        let base = priced_order();
        let draft = OrderDraft {
            customer: base.customer.clone(),
            items: base.items.clone(),
            exchange_credit: base.total_amount,
            advance_pct: 10.0,
            months: 3,
            protection_enabled: true,
            protection_limit: 500.0,
        };
        let order = build_order(draft, &settings(), base.created_at).unwrap();

        let inside_grace = Utc.with_ymd_and_hms(2026, 2, 10, 8, 0, 0).unwrap();
        let past_grace = Utc.with_ymd_and_hms(2026, 2, 11, 6, 0, 0).unwrap();
        assert!(decide(&order, inside_grace, None, &settings()).unwrap().is_none());
        assert!(decide(&order, past_grace, None, &settings()).unwrap().is_none());
    }

    #[test]
    fn test_lapse_ignores_spacing() {
        let order = sample_order();
        let now = at(11, 6);
        let decision = decide(&order, now, Some(at(11, 5)), &settings()).unwrap();

        match decision {
            Some(AutopilotDecision::Lapse { order: lapsed, message }) => {
                assert_eq!(lapsed.plan.protection_status, ProtectionStatus::Lapsed);
                assert_eq!(
                    lapsed.original_snapshot.as_ref().map(|s| s.reason),
                    Some(SnapshotReason::GracePeriodExpired)
                );
                assert_eq!(message.kind, MessageKind::ProtectionLapsed);
            }
            other => panic!("expected a lapse, got {:?}", other),
        }
    }

    #[test]
    fn test_lapsed_order_follow_up_interval() {
        let order = lapse_protection(
            &priced_order(),
            SnapshotReason::GracePeriodExpired,
            at(11, 6),
        );
        let now = at(20, 12);
        let mut store = settings();
        store.current_gold_rate_24k = 7800.0;

        let four_days_ago = now - Duration::days(4);
        let decision = decide(&order, now, Some(four_days_ago), &store).unwrap();
        match decision {
            Some(AutopilotDecision::DynamicQuote { quote, message, .. }) => {
                assert_eq!(quote.quoted_rate, 7800.0);
                assert_eq!(quote.original_total, order.total_amount);
                assert!(quote.quoted_total > quote.original_total);
                assert_eq!(message.kind, MessageKind::DynamicQuote);
            }
            other => panic!("expected a dynamic quote, got {:?}", other),
        }

        let one_day_ago = now - Duration::days(1);
        assert!(decide(&order, now, Some(one_day_ago), &store).unwrap().is_none());
    }

    #[test]
    fn test_quote_does_not_mutate_order() {
        let order = lapse_protection(
            &priced_order(),
            SnapshotReason::GracePeriodExpired,
            at(11, 6),
        );
        let before = order.clone();
        let _ = decide(&order, at(20, 12), None, &settings()).unwrap();
        assert_eq!(order, before);
    }

    #[test]
    fn test_lapsed_with_bad_rate_is_an_error() {
        let order = lapse_protection(&sample_order(), SnapshotReason::GracePeriodExpired, at(11, 6));
        let result = decide(&order, at(20, 12), None, &StoreSettings::default());
        assert!(matches!(result, Err(CoreError::InvalidRate { .. })));
    }

    #[test]
    fn test_closed_orders_are_skipped() {
        let mut order = sample_order();
        order.status = OrderStatus::Cancelled;
        assert!(decide(&order, at(20, 12), None, &settings()).unwrap().is_none());
    }
}
