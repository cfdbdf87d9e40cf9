//! # Gold-Rate Protection
//!
//! Decides whether an order's booked rate still holds and applies the
//! lapse, revocation and accept-new-rate transitions.
//!
//! ## Timeline of One Missed Milestone
//! ```text
//!            due (00:00 UTC)            due + grace
//!                 │                          │
//!   ──NotDue──────┼────────WithinGrace───────┼─────GraceExpired──────►
//!                 │   protection ACTIVE,     │   lapse: ACTIVE → LAPSED,
//!                 │   escalating warnings    │   snapshot written once
//! ```
//!
//! ## Snapshot Rule
//! `original_snapshot` records the order as it stood before it first lost
//! protection. An automatic lapse never overwrites it. A manual revocation
//! may replace it, but only when the stored reason is a different one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::repricing::reprice;
use crate::types::{
    Order, OrderStatus, OriginalSnapshot, ProtectionStatus, SnapshotReason, StoreSettings,
};

/// Where an order stands relative to its earliest unpaid due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtectionCheck {
    /// Closed, fully paid, or never protected.
    NotApplicable,
    /// The earliest unpaid milestone is not due yet.
    NotDue,
    /// Overdue, but the grace window is still open.
    WithinGrace { milestone_id: String, overdue_hours: i64 },
    /// Overdue beyond the grace window while still protected.
    GraceExpired { milestone_id: String, overdue_hours: i64 },
    /// Protection has already lapsed.
    Lapsed,
}

/// Evaluates protection for `order` at `now`.
///
/// ACTIVE and WARNING are treated alike: both still hold the booked rate.
pub fn evaluate_protection(order: &Order, now: DateTime<Utc>, grace_hours: u32) -> ProtectionCheck {
    if !order.is_open() {
        return ProtectionCheck::NotApplicable;
    }

    if order.plan.protection_status == ProtectionStatus::Lapsed {
        return ProtectionCheck::Lapsed;
    }

    let Some(milestone) = order.plan.next_unpaid() else {
        return ProtectionCheck::NotApplicable;
    };

    let due = milestone.due_at();
    if now <= due {
        return ProtectionCheck::NotDue;
    }

    let overdue = now - due;
    let overdue_hours = overdue.num_hours();
    if overdue < Duration::hours(i64::from(grace_hours)) {
        ProtectionCheck::WithinGrace {
            milestone_id: milestone.id.clone(),
            overdue_hours,
        }
    } else {
        ProtectionCheck::GraceExpired {
            milestone_id: milestone.id.clone(),
            overdue_hours,
        }
    }
}

fn snapshot_of(order: &Order, reason: SnapshotReason, now: DateTime<Utc>) -> OriginalSnapshot {
    OriginalSnapshot {
        total_amount: order.total_amount,
        gold_rate: order.plan.protection_rate_booked,
        items: order.items.clone(),
        reason,
        captured_at: now,
    }
}

/// Moves protection to LAPSED and captures the pre-lapse snapshot.
///
/// Calling this on an already-lapsed order changes nothing but the status
/// (which is already LAPSED), so a repeated cycle cannot disturb the
/// snapshot.
pub fn lapse_protection(order: &Order, reason: SnapshotReason, now: DateTime<Utc>) -> Order {
    let mut updated = order.clone();
    updated.plan.protection_status = ProtectionStatus::Lapsed;

    let replace = match (&order.original_snapshot, reason) {
        (None, _) => true,
        (Some(existing), SnapshotReason::ManualRevocation) => existing.reason != reason,
        (Some(_), SnapshotReason::GracePeriodExpired) => false,
    };
    if replace {
        updated.original_snapshot = Some(snapshot_of(order, reason, now));
    }

    updated
}

/// Staff-initiated lapse, regardless of due dates or grace.
///
/// ## Errors
/// The order is no longer collecting (completed, delivered or cancelled).
pub fn revoke_protection(order: &Order, now: DateTime<Utc>) -> CoreResult<Order> {
    if !order.status.is_collecting() {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status.to_string(),
        });
    }

    Ok(lapse_protection(order, SnapshotReason::ManualRevocation, now))
}

/// Customer-confirmed move to the current market rate.
///
/// Reprices the order and restores ACTIVE protection at `new_rate_24k`.
///
/// ## Errors
/// - the order was already delivered
/// - the rate or settings cannot be priced against
pub fn accept_new_rate(order: &Order, new_rate_24k: f64, settings: &StoreSettings) -> CoreResult<Order> {
    if order.status == OrderStatus::Delivered {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status.to_string(),
        });
    }

    reprice(order, new_rate_24k, settings)
}

// =============================================================================
// Unit Tests
// =============================================================================
