//! # Milestone Status Projection
//!
//! Derives every milestone's status from the total paid so far.
//!
//! ## Projection Rule
//! ```text
//!   cumulative:  ₹10,000     ₹40,000     ₹70,000     ₹1,00,000
//!                   │           │           │            │
//!   paid ₹40,000 ───┴───────────┘           │            │
//!                 PAID        PAID        PENDING      PENDING
//!
//!   paid ₹55,000 ───────────────────────┐   │
//!                 PAID        PAID      PARTIAL        PENDING
//! ```
//!
//! Statuses are recomputed from scratch on every payment, never patched,
//! so the result does not depend on payment order or repricing history.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Milestone, MilestoneStatus, Order, OrderStatus, Payment};
use crate::validation::validate_payment_amount;

/// Tolerance when deciding an order is fully paid.
pub const SETTLEMENT_TOLERANCE: Money = Money::from_rupees(1);

/// Returns the status a milestone has when `total_paid` has been received.
pub fn status_for(milestone: &Milestone, total_paid: Money) -> MilestoneStatus {
    let starts_at = milestone.cumulative_target - milestone.target_amount;

    if total_paid >= milestone.cumulative_target {
        MilestoneStatus::Paid
    } else if total_paid > starts_at {
        MilestoneStatus::Partial
    } else {
        MilestoneStatus::Pending
    }
}

/// Re-derives the status of every milestone from `total_paid`.
///
/// Only `status` changes; targets, dates and warning counts are copied.
pub fn project_statuses(milestones: &[Milestone], total_paid: Money) -> Vec<Milestone> {
    milestones
        .iter()
        .map(|milestone| Milestone {
            status: status_for(milestone, total_paid),
            ..milestone.clone()
        })
        .collect()
}

/// Returns true once `total_paid` covers `net_payable` within tolerance.
pub fn is_settled(total_paid: Money, net_payable: Money) -> bool {
    total_paid + SETTLEMENT_TOLERANCE >= net_payable
}

/// Re-projects an order's milestones and completes it if it is paid up.
///
/// Delivered and cancelled orders keep their status.
pub fn reproject(order: &Order) -> Order {
    let total_paid = order.total_paid();
    let mut updated = order.clone();
    updated.plan.milestones = project_statuses(&order.plan.milestones, total_paid);

    if updated.status.is_collecting() && is_settled(total_paid, updated.net_payable) {
        updated.status = OrderStatus::Completed;
    }

    updated
}

/// Records a payment and returns the updated order.
///
/// ## Flow
/// ```text
/// validate amount ──► append payment ──► re-project statuses ──► COMPLETED?
/// ```
///
/// ## Errors
/// - non-positive amount
/// - the order is cancelled or delivered
pub fn record_payment(order: &Order, payment: Payment) -> CoreResult<Order> {
    validate_payment_amount(payment.amount)?;

    if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Delivered) {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status.to_string(),
        });
    }

    let mut updated = order.clone();
    updated.payments.push(payment);
    Ok(reproject(&updated))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::generate_schedule;
    use crate::testing::sample_order;
    use crate::types::PaymentMethod;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn schedule() -> Vec<Milestone> {
        generate_schedule(
            Money::from_rupees(100000),
            10.0,
            3,
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        )
        .unwrap()
    }

    fn statuses(milestones: &[Milestone]) -> Vec<MilestoneStatus> {
        milestones.iter().map(|m| m.status).collect()
    }

    #[test]
    fn test_forty_thousand_paid() {
        use MilestoneStatus::*;
        let projected = project_statuses(&schedule(), Money::from_rupees(40000));
        assert_eq!(statuses(&projected), vec![Paid, Paid, Pending, Pending]);
    }

    #[test]
    fn test_partial_payment() {
        use MilestoneStatus::*;
        let projected = project_statuses(&schedule(), Money::from_rupees(55000));
        assert_eq!(statuses(&projected), vec![Paid, Paid, Partial, Pending]);

        let nothing = project_statuses(&schedule(), Money::zero());
        assert_eq!(statuses(&nothing), vec![Pending; 4]);
    }

    #[test]
    fn test_projection_is_from_scratch() {
        use MilestoneStatus::*;
        let mut stale = schedule();
        stale[3].status = Paid;
        let projected = project_statuses(&stale, Money::from_rupees(10000));
        assert_eq!(statuses(&projected), vec![Paid, Pending, Pending, Pending]);
    }

    #[test]
    fn test_record_payment_completes_order() {
        let order = sample_order();
        let when = Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap();

        let first = record_payment(
            &order,
            Payment::new(when, Money::from_rupees(40000), PaymentMethod::Upi),
        )
        .unwrap();
        assert_eq!(first.status, OrderStatus::Active);
        assert_eq!(first.total_paid().rupees(), 40000);
        assert_eq!(order.payments.len(), 0);

        // one rupee short still settles
        let rest = order.net_payable - Money::from_rupees(40001);
        let second = record_payment(&first, Payment::new(when, rest, PaymentMethod::Cash)).unwrap();
        assert_eq!(second.status, OrderStatus::Completed);
    }

    #[test]
    fn test_record_payment_rejects_bad_input() {
        let order = sample_order();
        let when = Utc.with_ymd_and_hms(2026, 1, 12, 10, 0, 0).unwrap();

        assert!(record_payment(&order, Payment::new(when, Money::zero(), PaymentMethod::Cash)).is_err());

        let mut cancelled = order.clone();
        cancelled.status = OrderStatus::Cancelled;
        let result = record_payment(
            &cancelled,
            Payment::new(when, Money::from_rupees(100), PaymentMethod::Cash),
        );
        assert!(matches!(result, Err(CoreError::OrderClosed { .. })));
    }
}
