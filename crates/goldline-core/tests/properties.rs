//! Property-based tests for schedules, projection and repricing
//!
//! These tests use proptest to check the invariants every order relies on

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use goldline_core::projection::{project_statuses, record_payment};
use goldline_core::protection::lapse_protection;
use goldline_core::schedule::generate_schedule;
use goldline_core::*;
use proptest::prelude::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
}

fn settings(rate: f64) -> StoreSettings {
    StoreSettings {
        current_gold_rate_24k: rate,
        ..StoreSettings::default()
    }
}

/// Generate an arbitrary priced item
fn arb_item() -> impl Strategy<Value = JewelryItem> {
    (
        prop_oneof![Just(Purity::K18), Just(Purity::K22), Just(Purity::K24)],
        1u32..2_000,
        0u32..25,
        0u32..1_500,
        0i64..50_000,
    )
        .prop_map(|(purity, centigrams, wastage, making, stones)| {
            JewelryItem::new(
                "Item",
                purity,
                f64::from(centigrams) / 10.0,
                f64::from(wastage),
                f64::from(making),
                Money::from_rupees(stones),
            )
        })
}

/// Generate an order booked at `rate` with a plan and some payments
fn arb_order() -> impl Strategy<Value = Order> {
    (
        prop::collection::vec(arb_item(), 1..4),
        4_000u32..12_000,
        0u32..=50,
        1u32..=12,
        prop::collection::vec(1i64..60_000, 0..5),
    )
        .prop_map(|(items, rate, advance, months, payments)| {
            let draft = OrderDraft {
                customer: Customer {
                    id: "C-P".to_string(),
                    name: "Prop".to_string(),
                    contact: "+919800000099".to_string(),
                },
                items,
                exchange_credit: Money::zero(),
                advance_pct: f64::from(advance),
                months,
                protection_enabled: true,
                protection_limit: 0.0,
            };
            let now = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
            let mut order = build_order(draft, &settings(f64::from(rate)), now).unwrap();

            for amount in payments {
                let payment = Payment::new(now, Money::from_rupees(amount), PaymentMethod::Cash);
                order = record_payment(&order, payment).unwrap();
            }
            order
        })
}

proptest! {
    #[test]
    fn schedule_sums_to_payable(
        total in 1i64..10_000_000,
        advance in 0u32..=100,
        months in 1u32..=36,
    ) {
        let schedule = generate_schedule(
            Money::from_rupees(total),
            f64::from(advance),
            months,
            start(),
        ).unwrap();

        let sum: Money = schedule.iter().map(|m| m.target_amount).sum();
        prop_assert_eq!(sum.rupees(), total);
        prop_assert_eq!(schedule.last().unwrap().cumulative_target.rupees(), total);
        prop_assert!(schedule.windows(2).all(|w| w[0].due_date <= w[1].due_date));
        prop_assert!(schedule.iter().all(|m| !m.target_amount.is_negative()));
        prop_assert!(schedule
            .windows(2)
            .all(|w| w[0].cumulative_target <= w[1].cumulative_target));
    }

    #[test]
    fn projection_is_monotonic(
        total in 1i64..1_000_000,
        months in 1u32..=12,
        a in 0i64..1_200_000,
        b in 0i64..1_200_000,
    ) {
        let schedule = generate_schedule(Money::from_rupees(total), 20.0, months, start()).unwrap();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let before = project_statuses(&schedule, Money::from_rupees(low));
        let after = project_statuses(&schedule, Money::from_rupees(high));
        for (x, y) in before.iter().zip(&after) {
            prop_assert!(x.status <= y.status);
        }
    }

    #[test]
    fn repricing_conserves_paid_history(order in arb_order(), rate in 3_000u32..15_000) {
        let repriced = reprice(&order, f64::from(rate), &settings(f64::from(rate))).unwrap();

        let paid_before: Vec<&Milestone> =
            order.plan.milestones.iter().filter(|m| m.is_paid()).collect();
        for milestone in &paid_before {
            prop_assert!(repriced.plan.milestones.contains(milestone));
        }

        let rebuilt: Money = repriced
            .plan
            .milestones
            .iter()
            .filter(|m| !paid_before.iter().any(|p| p.id == m.id))
            .map(|m| m.target_amount)
            .sum();
        let remaining = (repriced.net_payable - order.total_paid()).floor_zero();
        prop_assert_eq!(rebuilt, remaining);
        prop_assert_eq!(repriced.total_paid(), order.total_paid());
    }

    #[test]
    fn repricing_twice_is_stable(order in arb_order(), rate in 3_000u32..15_000) {
        let s = settings(f64::from(rate));
        let once = reprice(&order, f64::from(rate), &s).unwrap();
        let twice = reprice(&once, f64::from(rate), &s).unwrap();

        prop_assert_eq!(once.total_amount, twice.total_amount);
        prop_assert_eq!(once.net_payable, twice.net_payable);
        prop_assert_eq!(&once.items, &twice.items);
        prop_assert_eq!(&once.plan.milestones, &twice.plan.milestones);
    }

    #[test]
    fn lapse_snapshot_is_written_once(order in arb_order(), later_hours in 1i64..5_000) {
        let first_at = Utc.with_ymd_and_hms(2026, 2, 11, 6, 0, 0).unwrap();
        let first = lapse_protection(&order, SnapshotReason::GracePeriodExpired, first_at);
        let second = lapse_protection(
            &first,
            SnapshotReason::GracePeriodExpired,
            first_at + Duration::hours(later_hours),
        );

        prop_assert!(first.original_snapshot.is_some());
        prop_assert_eq!(&first.original_snapshot, &second.original_snapshot);
        prop_assert_eq!(second.plan.protection_status, ProtectionStatus::Lapsed);
    }
}
