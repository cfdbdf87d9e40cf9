//! # Order Building and Handover
//!
//! Creates orders from a submitted draft and applies the explicit status
//! changes staff make by hand.
//!
//! ## Order Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft (from the order form)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate customer + every item (zero weight rejected here)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_items(current 24K rate) ──► total ──► net payable               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  generate_schedule(net payable, advance %, months, today)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Order { plan: protection ACTIVE at the booked rate }                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reproject (zero net payable ──► milestones PAID, order COMPLETED)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{items_total, price_items};
use crate::projection::reproject;
use crate::schedule::generate_schedule;
use crate::types::{
    Customer, JewelryItem, Order, OrderStatus, PaymentPlan, ProtectionStatus, StoreSettings,
};
use crate::validation::{validate_customer, validate_item_for_submission};

/// What the order form submits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer: Customer,
    pub items: Vec<JewelryItem>,
    /// Old-gold or trade-in credit.
    #[serde(default)]
    pub exchange_credit: Money,
    pub advance_pct: f64,
    pub months: u32,
    #[serde(default = "default_protection")]
    pub protection_enabled: bool,
    /// Maximum rate movement covered (informational).
    #[serde(default)]
    pub protection_limit: f64,
}

fn default_protection() -> bool {
    true
}

/// Prices a draft at the current market rate and builds its plan.
///
/// ## Errors
/// - missing customer name or contact
/// - an item with zero/negative weight or negative charges
/// - an unusable market rate or purity factor
/// - invalid plan terms
pub fn build_order(
    draft: OrderDraft,
    settings: &StoreSettings,
    now: DateTime<Utc>,
) -> CoreResult<Order> {
    validate_customer(&draft.customer)?;
    if draft.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    for item in &draft.items {
        validate_item_for_submission(item)?;
    }

    let rate = settings.current_gold_rate_24k;
    let items = price_items(&draft.items, rate, settings)?;
    let total_amount = items_total(&items);
    let net_payable = (total_amount - draft.exchange_credit).floor_zero();

    let milestones =
        generate_schedule(net_payable, draft.advance_pct, draft.months, now.date_naive())?;
    let protection_deadline = milestones.last().map(|m| m.due_date);

    let order = Order {
        id: uuid::Uuid::new_v4().to_string(),
        customer: draft.customer,
        items,
        payments: Vec::new(),
        total_amount,
        exchange_credit: draft.exchange_credit,
        net_payable,
        gold_rate_at_booking: rate,
        plan: PaymentPlan {
            months: draft.months,
            advance_pct: draft.advance_pct,
            interest_pct: 0.0,
            protection_enabled: draft.protection_enabled,
            protection_rate_booked: rate,
            protection_deadline,
            protection_limit: draft.protection_limit,
            protection_status: ProtectionStatus::Active,
            milestones,
            original_milestones: None,
        },
        status: OrderStatus::Active,
        created_at: now,
        original_snapshot: None,
    };

    Ok(reproject(&order))
}

/// Hands a fully paid order over to the customer.
pub fn mark_delivered(order: &Order) -> CoreResult<Order> {
    if order.status != OrderStatus::Completed {
        return Err(CoreError::InvalidTransition {
            order_id: order.id.clone(),
            from: order.status.to_string(),
            to: OrderStatus::Delivered.to_string(),
        });
    }

    let mut updated = order.clone();
    updated.status = OrderStatus::Delivered;
    Ok(updated)
}

/// Cancels an order that has not been handed over.
pub fn cancel_order(order: &Order) -> CoreResult<Order> {
    if matches!(order.status, OrderStatus::Delivered | OrderStatus::Cancelled) {
        return Err(CoreError::InvalidTransition {
            order_id: order.id.clone(),
            from: order.status.to_string(),
            to: OrderStatus::Cancelled.to_string(),
        });
    }

    let mut updated = order.clone();
    updated.status = OrderStatus::Cancelled;
    Ok(updated)
}

/// Flags a collecting order as behind schedule (or clears the flag).
pub fn set_overdue(order: &Order, overdue: bool) -> CoreResult<Order> {
    if !order.status.is_collecting() {
        return Err(CoreError::OrderClosed {
            order_id: order.id.clone(),
            status: order.status.to_string(),
        });
    }

    let mut updated = order.clone();
    updated.status = if overdue {
        OrderStatus::Overdue
    } else {
        OrderStatus::Active
    };
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MilestoneStatus, Purity};
    use chrono::{NaiveDate, TimeZone};

    fn settings() -> StoreSettings {
        StoreSettings {
            current_gold_rate_24k: 7500.0,
            ..StoreSettings::default()
        }
    }

    fn draft() -> OrderDraft {
        OrderDraft {
            customer: Customer {
                id: "C-7".to_string(),
                name: "Anjali".to_string(),
                contact: "+919800000007".to_string(),
            },
            items: vec![JewelryItem::new(
                "Necklace",
                Purity::K22,
                10.0,
                12.0,
                450.0,
                Money::zero(),
            )],
            exchange_credit: Money::from_rupees(3887),
            advance_pct: 10.0,
            months: 4,
            protection_enabled: true,
            protection_limit: 500.0,
        }
    }

    #[test]
    fn test_build_order_prices_and_schedules() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let order = build_order(draft(), &settings(), now).unwrap();

        assert_eq!(order.total_amount.rupees(), 83887);
        assert_eq!(order.net_payable.rupees(), 80000);
        assert_eq!(order.plan.scheduled_total(), order.net_payable);
        assert_eq!(order.plan.milestones.len(), 5);
        assert_eq!(
            order.plan.milestones[0].due_date,
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
        );
        assert_eq!(
            order.plan.protection_deadline,
            Some(NaiveDate::from_ymd_opt(2026, 5, 10).unwrap())
        );
        assert_eq!(order.plan.protection_rate_booked, 7500.0);
        assert_eq!(order.plan.protection_status, ProtectionStatus::Active);
        assert!(order
            .plan
            .milestones
            .iter()
            .all(|m| m.status == MilestoneStatus::Pending));
    }

    #[test]
    fn test_build_order_rejects_zero_weight() {
        let mut bad = draft();
        bad.items[0].net_weight = 0.0;
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        assert!(matches!(
            build_order(bad, &settings(), now),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_build_order_rejects_missing_rate() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let result = build_order(draft(), &StoreSettings::default(), now);
        assert!(matches!(result, Err(CoreError::InvalidRate { .. })));
    }

    #[test]
    fn test_exchange_credit_cannot_go_negative() {
        let mut generous = draft();
        generous.exchange_credit = Money::from_rupees(200000);
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let order = build_order(generous, &settings(), now).unwrap();
        assert!(order.net_payable.is_zero());
    }

    #[test]
    fn test_fully_credited_order_completes_at_booking() {
        let mut generous = draft();
        generous.exchange_credit = Money::from_rupees(1_000_000);
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let order = build_order(generous, &settings(), now).unwrap();

        assert!(order.net_payable.is_zero());
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order
            .plan
            .milestones
            .iter()
            .all(|m| m.status == MilestoneStatus::Paid));
        assert!(!order.is_open());
        assert!(mark_delivered(&order).is_ok());
    }

    #[test]
    fn test_delivery_requires_completion() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let order = build_order(draft(), &settings(), now).unwrap();
        assert!(mark_delivered(&order).is_err());

        let mut completed = order.clone();
        completed.status = OrderStatus::Completed;
        let delivered = mark_delivered(&completed).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(cancel_order(&delivered).is_err());
    }

    #[test]
    fn test_overdue_flag() {
        let now = Utc.with_ymd_and_hms(2026, 1, 10, 11, 30, 0).unwrap();
        let order = build_order(draft(), &settings(), now).unwrap();
        let flagged = set_overdue(&order, true).unwrap();
        assert_eq!(flagged.status, OrderStatus::Overdue);
        assert_eq!(set_overdue(&flagged, false).unwrap().status, OrderStatus::Active);

        let cancelled = cancel_order(&order).unwrap();
        assert!(set_overdue(&cancelled, true).is_err());
    }
}
