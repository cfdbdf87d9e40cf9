//! Shared fixtures for unit tests.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::money::Money;
use crate::order::{build_order, OrderDraft};
use crate::schedule::generate_schedule;
use crate::types::{
    Customer, JewelryItem, Order, OrderStatus, PaymentPlan, ProtectionStatus, Purity,
    StoreSettings,
};

pub(crate) fn settings() -> StoreSettings {
    StoreSettings {
        current_gold_rate_24k: 7500.0,
        ..StoreSettings::default()
    }
}

fn customer() -> Customer {
    Customer {
        id: "C-1".to_string(),
        name: "Meera".to_string(),
        contact: "+919800000001".to_string(),
    }
}

/// ₹1,00,000 plan, 10% advance over three months from 2026-01-10.
/// Milestones: 10000 / 30000 / 30000 / 30000, nothing paid. No items.
pub(crate) fn sample_order() -> Order {
    let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let total = Money::from_rupees(100000);
    let milestones = generate_schedule(total, 10.0, 3, start).unwrap();

    Order {
        id: "ORD-1".to_string(),
        customer: customer(),
        items: Vec::new(),
        payments: Vec::new(),
        total_amount: total,
        exchange_credit: Money::zero(),
        net_payable: total,
        gold_rate_at_booking: 7500.0,
        plan: PaymentPlan {
            months: 3,
            advance_pct: 10.0,
            interest_pct: 0.0,
            protection_enabled: true,
            protection_rate_booked: 7500.0,
            protection_deadline: milestones.last().map(|m| m.due_date),
            protection_limit: 500.0,
            protection_status: ProtectionStatus::Active,
            milestones,
            original_milestones: None,
        },
        status: OrderStatus::Active,
        created_at: Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap(),
        original_snapshot: None,
    }
}

/// One 22K necklace (10 g, 12% wastage, ₹450/g making) booked at ₹7500/g
/// on 2026-01-10: total ₹83,887, 10% advance over three months.
/// Milestones: 8389 / 25166 / 25166 / 25166.
pub(crate) fn priced_order() -> Order {
    let draft = OrderDraft {
        customer: customer(),
        items: vec![JewelryItem::new(
            "Necklace",
            Purity::K22,
            10.0,
            12.0,
            450.0,
            Money::zero(),
        )],
        exchange_credit: Money::zero(),
        advance_pct: 10.0,
        months: 3,
        protection_enabled: true,
        protection_limit: 500.0,
    };
    let now = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();

    let mut order = build_order(draft, &settings(), now).unwrap();
    order.id = "ORD-2".to_string();
    order
}
