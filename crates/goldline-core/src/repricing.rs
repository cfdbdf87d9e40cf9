//! # Market Repricing
//!
//! Recomputes an order at a new 24K rate and spreads the new balance over
//! the milestones that are not yet paid.
//!
//! ## Repricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items ──price_item(new rate)──► new total ──► new net payable         │
//! │                                                     │                   │
//! │                         total paid (unchanged) ─────┤                   │
//! │                                                     ▼                   │
//! │                                   remaining = max(0, net − paid)        │
//! │                                                     │                   │
//! │  milestones ──partition──► PAID (kept byte-for-byte)│                   │
//! │                        └─► unpaid ──redistribute────┘                   │
//! │                                 (last bucket absorbs remainder)         │
//! │                                                                         │
//! │  merge + sort by due date ──► re-project ──► protection ACTIVE at the   │
//! │                                               new rate                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The input order is never modified; a new `Order` is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::pricing::{items_total, price_items};
use crate::projection::reproject;
use crate::types::{Milestone, MilestoneStatus, Order, OrderStatus, ProtectionStatus, StoreSettings};

/// Original versus repriced figures for one order at one rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RepriceQuote {
    pub order_id: String,
    /// Total before the first lapse (or the current total if none).
    pub original_total: Money,
    pub original_rate: f64,
    pub quoted_total: Money,
    pub quoted_rate: f64,
    pub total_paid: Money,
    /// What the customer would still owe at the quoted rate.
    pub quoted_balance: Money,
}

impl RepriceQuote {
    /// How much more (or, if negative, less) the order costs at the quoted rate.
    pub fn difference(&self) -> Money {
        self.quoted_total - self.original_total
    }
}

/// Reprices an order at `new_rate_24k`.
///
/// ## Rules
/// - PAID milestones are history and are copied untouched
/// - every other milestone keeps its ID and due date, gets a new target,
///   and restarts as PENDING with no warnings
/// - if nothing is unpaid but money is still owed, one adjustment milestone
///   is added on the plan's last due date
/// - a price drop below what was already paid leaves a zero balance
/// - the schedule as it stood before the first repricing is kept in
///   `original_milestones` and never overwritten
/// - protection returns to ACTIVE at the new rate and the order resumes
///   collecting (completed immediately if already covered)
///
/// ## Errors
/// A zero, negative or non-finite rate or purity factor.
pub fn reprice(order: &Order, new_rate_24k: f64, settings: &StoreSettings) -> CoreResult<Order> {
    let items = price_items(&order.items, new_rate_24k, settings)?;
    let total_amount = items_total(&items);
    let net_payable = (total_amount - order.exchange_credit).floor_zero();

    let total_paid = order.total_paid();
    let remaining = (net_payable - total_paid).floor_zero();

    let (paid, unpaid): (Vec<Milestone>, Vec<Milestone>) = order
        .plan
        .milestones
        .iter()
        .cloned()
        .partition(Milestone::is_paid);

    let mut slots: Vec<(String, NaiveDate)> =
        unpaid.into_iter().map(|m| (m.id, m.due_date)).collect();

    if slots.is_empty() && remaining.is_positive() {
        let due = order
            .plan
            .milestones
            .last()
            .map(|m| m.due_date)
            .or(order.plan.protection_deadline)
            .unwrap_or_else(|| order.created_at.date_naive());
        slots.push((
            format!("MS-ADJ-{:02}", order.plan.milestones.len()),
            due,
        ));
    }

    let targets = remaining.split_last_absorbs(slots.len());
    let mut running = total_paid;
    let rebuilt = slots.into_iter().zip(targets).map(|((id, due_date), target_amount)| {
        running += target_amount;
        Milestone {
            id,
            due_date,
            target_amount,
            cumulative_target: running,
            status: MilestoneStatus::Pending,
            warning_count: 0,
        }
    });

    let mut milestones: Vec<Milestone> = paid.into_iter().chain(rebuilt).collect();
    milestones.sort_by_key(|m| m.due_date);

    let mut updated = order.clone();
    updated.items = items;
    updated.total_amount = total_amount;
    updated.net_payable = net_payable;
    updated.gold_rate_at_booking = new_rate_24k;
    updated.status = OrderStatus::Active;

    let plan = &mut updated.plan;
    if plan.original_milestones.is_none() {
        plan.original_milestones = Some(order.plan.milestones.clone());
    }
    plan.protection_deadline = milestones.last().map(|m| m.due_date);
    plan.milestones = milestones;
    plan.protection_status = ProtectionStatus::Active;
    plan.protection_rate_booked = new_rate_24k;

    Ok(reproject(&updated))
}

/// Computes what an order would cost at `rate_24k` without committing.
///
/// The returned quote compares against the pre-lapse snapshot when one
/// exists, so repeated nudges keep quoting against the same reference.
pub fn quote_at_rate(order: &Order, rate_24k: f64, settings: &StoreSettings) -> CoreResult<RepriceQuote> {
    let hypothetical = reprice(order, rate_24k, settings)?;

    let (original_total, original_rate) = match &order.original_snapshot {
        Some(snapshot) => (snapshot.total_amount, snapshot.gold_rate),
        None => (order.total_amount, order.plan.protection_rate_booked),
    };

    let total_paid = order.total_paid();
    Ok(RepriceQuote {
        order_id: order.id.clone(),
        original_total,
        original_rate,
        quoted_total: hypothetical.total_amount,
        quoted_rate: rate_24k,
        total_paid,
        quoted_balance: (hypothetical.net_payable - total_paid).floor_zero(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
