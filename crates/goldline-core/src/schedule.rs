//! # Milestone Schedule Generator
//!
//! Turns a payable total and plan shape into dated installments.
//!
//! ## Schedule Shape
//! ```text
//! payable ₹1,00,000 · advance 10% · 3 months · start 2026-01-10
//!
//!   MS-00  2026-01-10  ₹10,000   cumulative ₹10,000    (advance, due today)
//!   MS-01  2026-02-10  ₹30,000   cumulative ₹40,000
//!   MS-02  2026-03-10  ₹30,000   cumulative ₹70,000
//!   MS-03  2026-04-10  ₹30,000   cumulative ₹1,00,000  (absorbs remainder)
//! ```

use chrono::{Months, NaiveDate};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Milestone, MilestoneStatus};
use crate::validation::validate_plan_terms;

/// Builds the milestone ID for position `index` in a schedule.
pub fn milestone_id(index: usize) -> String {
    format!("MS-{:02}", index)
}

/// Adds calendar months, clamping to the last day of shorter months.
pub(crate) fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Generates the installment schedule for a plan.
///
/// ## Algorithm
/// 1. `advance = round(total × advance% / 100)`, due on `start`
/// 2. `per_month = round((total − advance) / months)`
/// 3. month `i` (1..=months) falls due `i` calendar months after `start`;
///    the last month takes `remaining − per_month × (months − 1)`. If that
///    would be negative, `per_month` drops to the floored share instead
/// 4. cumulative targets are running sums; everything starts PENDING
///
/// An advance that rounds to zero is not emitted, so the first installment
/// is the first milestone. Same inputs always give the same schedule,
/// including the milestone IDs.
///
/// ## Errors
/// - `months == 0` or `advance_pct` outside 0..=100
/// - a negative payable total
pub fn generate_schedule(
    payable_total: Money,
    advance_pct: f64,
    months: u32,
    start: NaiveDate,
) -> CoreResult<Vec<Milestone>> {
    validate_plan_terms(advance_pct, months)?;

    if payable_total.is_negative() {
        return Err(CoreError::InvalidPlan {
            reason: format!("payable total {} is negative", payable_total),
        });
    }

    let advance = payable_total.percent(advance_pct);
    let remaining = payable_total - advance;

    let mut dated: Vec<(NaiveDate, Money)> = Vec::with_capacity(months as usize + 1);
    if advance.is_positive() {
        dated.push((start, advance));
    }

    let installments = remaining.split_last_absorbs(months as usize);
    for (offset, amount) in installments.into_iter().enumerate() {
        dated.push((add_months(start, offset as u32 + 1), amount));
    }

    let milestones = build_milestones(dated, Money::zero());

    let scheduled: Money = milestones.iter().map(|m| m.target_amount).sum();
    if scheduled != payable_total {
        return Err(CoreError::ScheduleMismatch {
            expected: payable_total.rupees(),
            actual: scheduled.rupees(),
        });
    }

    Ok(milestones)
}

/// Turns `(due date, target)` pairs into PENDING milestones whose
/// cumulative targets start counting from `base`.
pub(crate) fn build_milestones(dated: Vec<(NaiveDate, Money)>, base: Money) -> Vec<Milestone> {
    let mut running = base;
    dated
        .into_iter()
        .enumerate()
        .map(|(index, (due_date, target_amount))| {
            running += target_amount;
            Milestone {
                id: milestone_id(index),
                due_date,
                target_amount,
                cumulative_target: running,
                status: MilestoneStatus::Pending,
                warning_count: 0,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn targets(milestones: &[Milestone]) -> Vec<i64> {
        milestones.iter().map(|m| m.target_amount.rupees()).collect()
    }

    #[test]
    fn test_ten_percent_advance_three_months() {
        let schedule =
            generate_schedule(Money::from_rupees(100000), 10.0, 3, date(2026, 1, 10)).unwrap();

        assert_eq!(targets(&schedule), vec![10000, 30000, 30000, 30000]);
        let cumulative: Vec<i64> = schedule.iter().map(|m| m.cumulative_target.rupees()).collect();
        assert_eq!(cumulative, vec![10000, 40000, 70000, 100000]);

        assert_eq!(schedule[0].due_date, date(2026, 1, 10));
        assert_eq!(schedule[1].due_date, date(2026, 2, 10));
        assert_eq!(schedule[3].due_date, date(2026, 4, 10));
        assert!(schedule
            .iter()
            .all(|m| m.status == MilestoneStatus::Pending && m.warning_count == 0));
    }

    #[test]
    fn test_remainder_goes_to_last_installment() {
        let schedule =
            generate_schedule(Money::from_rupees(83887), 10.0, 4, date(2026, 1, 1)).unwrap();

        // advance round(8388.7) = 8389, remaining 75498, per month round(18874.5) = 18875
        assert_eq!(targets(&schedule), vec![8389, 18875, 18875, 18875, 18873]);
        assert_eq!(schedule.last().unwrap().cumulative_target.rupees(), 83887);
    }

    #[test]
    fn test_tiny_payable_keeps_targets_non_negative() {
        let schedule =
            generate_schedule(Money::from_rupees(18), 0.0, 36, date(2026, 1, 1)).unwrap();

        assert_eq!(schedule.len(), 36);
        assert!(schedule[..35].iter().all(|m| m.target_amount.is_zero()));
        assert_eq!(schedule[35].target_amount.rupees(), 18);
        assert_eq!(schedule[35].cumulative_target.rupees(), 18);
    }

    #[test]
    fn test_zero_advance_is_not_emitted() {
        let schedule =
            generate_schedule(Money::from_rupees(60000), 0.0, 2, date(2026, 5, 1)).unwrap();
        assert_eq!(targets(&schedule), vec![30000, 30000]);
        assert_eq!(schedule[0].id, "MS-00");
        assert_eq!(schedule[0].due_date, date(2026, 6, 1));
    }

    #[test]
    fn test_month_end_clamps() {
        let schedule =
            generate_schedule(Money::from_rupees(30000), 0.0, 2, date(2026, 1, 31)).unwrap();
        assert_eq!(schedule[0].due_date, date(2026, 2, 28));
        assert_eq!(schedule[1].due_date, date(2026, 3, 31));
    }

    #[test]
    fn test_zero_months_is_rejected() {
        let result = generate_schedule(Money::from_rupees(1000), 10.0, 0, date(2026, 1, 1));
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_deterministic() {
        let a = generate_schedule(Money::from_rupees(250001), 15.0, 7, date(2026, 2, 14)).unwrap();
        let b = generate_schedule(Money::from_rupees(250001), 15.0, 7, date(2026, 2, 14)).unwrap();
        assert_eq!(a, b);
    }
}
