//! # Domain Types
//!
//! Core domain types for orders, payment plans and rate protection.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order (aggregate root)                          │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  JewelryItem    │   │    Payment      │   │  PaymentPlan    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  purity         │   │  id             │   │  months         │       │
//! │  │  net weight     │   │  date           │   │  advance %      │       │
//! │  │  wastage %      │   │  amount         │   │  protection     │       │
//! │  │  making/gram    │   │  method         │   │  milestones ──┐ │       │
//! │  │  final amount   │   │  (append-only)  │   │               │ │       │
//! │  └─────────────────┘   └─────────────────┘   └───────────────┼─┘       │
//! │                                                              ▼         │
//! │                                              ┌─────────────────┐       │
//! │                                              │   Milestone     │       │
//! │  OriginalSnapshot (written once at lapse)    │  due date       │       │
//! │  total / rate / items / reason               │  target         │       │
//! │                                              │  cumulative     │       │
//! │                                              │  status         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! An `Order` owns its items, payments and plan by value. Nothing in this
//! crate mutates an order that was passed in; operations take `&Order` and
//! return a new `Order`, so the owner of the order list can detect a change
//! and persist it.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%. GST on jewelry is 3% = 300 bps. Keeping the rate
/// as an integer lets tax be computed with integer math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (3.0 = 3%).
    ///
    /// Negative or non-finite percentages become zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate::zero();
        }
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Purity
// =============================================================================

/// Gold purity of an item. Drives which fraction of the 24K rate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Purity {
    #[serde(rename = "18K")]
    K18,
    #[serde(rename = "22K")]
    K22,
    #[serde(rename = "24K")]
    K24,
}

impl std::fmt::Display for Purity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Purity::K18 => write!(f, "18K"),
            Purity::K22 => write!(f, "22K"),
            Purity::K24 => write!(f, "24K"),
        }
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Payment status of a single milestone, derived from running totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    /// Nothing has been paid towards this milestone yet.
    #[default]
    Pending,
    /// Some, but not all, of this milestone has been covered.
    Partial,
    /// Cumulative payments cover this milestone in full.
    Paid,
}

/// Gold-rate protection status of a plan.
///
/// ## Lifecycle
/// ```text
///   ACTIVE ──► WARNING ──► LAPSED
///     │                      ▲
///     └──────────────────────┘
///
///   LAPSED ──(accept new rate)──► ACTIVE   (manual only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionStatus {
    /// The booked rate holds.
    #[default]
    Active,
    /// Informational intermediate state; still protected.
    Warning,
    /// The booked rate no longer holds; the order reprices at market.
    Lapsed,
}

impl ProtectionStatus {
    /// Returns true while the booked rate still holds.
    pub fn is_protected(&self) -> bool {
        matches!(self, ProtectionStatus::Active | ProtectionStatus::Warning)
    }

    /// Returns true if an automatic transition from `self` to `next` is
    /// allowed. Automatic transitions only move forward; returning to
    /// ACTIVE requires the manual accept-new-rate path.
    pub fn can_transition_to(&self, next: ProtectionStatus) -> bool {
        use ProtectionStatus::*;
        matches!(
            (self, next),
            (Active, Warning) | (Active, Lapsed) | (Warning, Lapsed)
        )
    }
}

impl std::fmt::Display for ProtectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtectionStatus::Active => write!(f, "active"),
            ProtectionStatus::Warning => write!(f, "warning"),
            ProtectionStatus::Lapsed => write!(f, "lapsed"),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Installments are being collected.
    #[default]
    Active,
    /// Fully paid, awaiting handover.
    Completed,
    /// Flagged by staff as behind schedule.
    Overdue,
    /// Handed over to the customer. Only set by an explicit action.
    Delivered,
    /// Abandoned.
    Cancelled,
}

impl OrderStatus {
    /// Returns true if installments are still being collected.
    pub fn is_collecting(&self) -> bool {
        matches!(self, OrderStatus::Active | OrderStatus::Overdue)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Active => write!(f, "active"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Overdue => write!(f, "overdue"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    /// Old gold accepted against the balance.
    GoldExchange,
}

// =============================================================================
// Snapshot Reason
// =============================================================================

/// Why an order's pre-lapse state was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SnapshotReason {
    #[serde(rename = "Grace Period Expired")]
    GracePeriodExpired,
    #[serde(rename = "Manual Revocation")]
    ManualRevocation,
}

impl std::fmt::Display for SnapshotReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotReason::GracePeriodExpired => write!(f, "Grace Period Expired"),
            SnapshotReason::ManualRevocation => write!(f, "Manual Revocation"),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Read-only settings consumed by pricing, protection and the autopilot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Current market rate for 24K gold, rupees per gram. Zero means unset.
    #[serde(default)]
    pub current_gold_rate_24k: f64,

    /// Fraction of the 24K rate charged for 22K (typically 0.916).
    #[serde(default = "default_purity_factor_22k")]
    pub purity_factor_22k: f64,

    /// Fraction of the 24K rate charged for 18K (typically 0.75).
    #[serde(default = "default_purity_factor_18k")]
    pub purity_factor_18k: f64,

    /// Flat tax percentage applied to every item (3.0 = 3%).
    #[serde(default = "default_tax_rate")]
    pub default_tax_rate: f64,

    /// Hours after a missed due date before protection lapses.
    #[serde(default = "default_grace_period_hours")]
    pub grace_period_hours: u32,

    /// Days between dynamic-quote nudges once protection has lapsed.
    #[serde(default = "default_follow_up_interval_days")]
    pub follow_up_interval_days: u32,

    /// Minimum hours between two grace-period warnings to one order.
    #[serde(default = "default_warning_spacing_hours")]
    pub warning_spacing_hours: u32,
}

fn default_purity_factor_22k() -> f64 {
    0.916
}

fn default_purity_factor_18k() -> f64 {
    0.75
}

fn default_tax_rate() -> f64 {
    3.0
}

fn default_grace_period_hours() -> u32 {
    24
}

fn default_follow_up_interval_days() -> u32 {
    3
}

fn default_warning_spacing_hours() -> u32 {
    4
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            current_gold_rate_24k: 0.0,
            purity_factor_22k: default_purity_factor_22k(),
            purity_factor_18k: default_purity_factor_18k(),
            default_tax_rate: default_tax_rate(),
            grace_period_hours: default_grace_period_hours(),
            follow_up_interval_days: default_follow_up_interval_days(),
            warning_spacing_hours: default_warning_spacing_hours(),
        }
    }
}

impl StoreSettings {
    /// Returns the configured tax as a `TaxRate`.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_percentage(self.default_tax_rate)
    }
}

// =============================================================================
// Jewelry Item
// =============================================================================

/// One priced line of an order.
///
/// The computed fields are always written together by
/// [`crate::pricing::price_item`]; they are never patched one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct JewelryItem {
    pub id: String,
    /// Ring, chain, bangle, ...
    pub category: String,
    pub purity: Purity,
    /// Net gold weight in grams.
    pub net_weight: f64,
    /// Wastage as a percentage of metal value.
    pub wastage_pct: f64,
    /// Making charge in rupees per gram.
    pub making_charge_per_gram: f64,
    /// Sum of all stone charges on this item.
    pub stone_total: Money,

    #[serde(default)]
    pub metal_value: Money,
    #[serde(default)]
    pub wastage_value: Money,
    #[serde(default)]
    pub labor_value: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub final_amount: Money,
}

impl JewelryItem {
    /// Creates an unpriced item. Computed fields start at zero.
    pub fn new(
        category: impl Into<String>,
        purity: Purity,
        net_weight: f64,
        wastage_pct: f64,
        making_charge_per_gram: f64,
        stone_total: Money,
    ) -> Self {
        JewelryItem {
            id: uuid::Uuid::new_v4().to_string(),
            category: category.into(),
            purity,
            net_weight,
            wastage_pct,
            making_charge_per_gram,
            stone_total,
            metal_value: Money::zero(),
            wastage_value: Money::zero(),
            labor_value: Money::zero(),
            tax: Money::zero(),
            final_amount: Money::zero(),
        }
    }
}

// =============================================================================
// Milestone
// =============================================================================

/// One scheduled installment within a payment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub target_amount: Money,
    /// Running sum of targets up to and including this milestone.
    pub cumulative_target: Money,
    #[serde(default)]
    pub status: MilestoneStatus,
    /// Escalation cursor for grace-period warnings.
    #[serde(default)]
    pub warning_count: u32,
}

impl Milestone {
    /// The instant this milestone falls due: 00:00 UTC on the due date.
    pub fn due_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.due_date.and_time(chrono::NaiveTime::default()))
    }

    /// Returns true if this milestone is fully covered.
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == MilestoneStatus::Paid
    }
}

// =============================================================================
// Payment Plan
// =============================================================================

/// Financing terms and the milestone schedule of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPlan {
    pub months: u32,
    pub advance_pct: f64,
    /// Reserved; not applied to schedules.
    #[serde(default)]
    pub interest_pct: f64,
    /// Whether the booked gold rate is protected at all.
    pub protection_enabled: bool,
    /// The 24K rate the order was priced at.
    pub protection_rate_booked: f64,
    /// Last milestone's due date.
    #[ts(as = "Option<String>")]
    pub protection_deadline: Option<NaiveDate>,
    /// Maximum rate deviation covered (informational).
    #[serde(default)]
    pub protection_limit: f64,
    #[serde(default)]
    pub protection_status: ProtectionStatus,
    pub milestones: Vec<Milestone>,
    /// Schedule as it stood before the first repricing.
    #[serde(default)]
    pub original_milestones: Option<Vec<Milestone>>,
}

impl PaymentPlan {
    /// The earliest milestone that is not fully paid.
    pub fn next_unpaid(&self) -> Option<&Milestone> {
        self.milestones.iter().find(|m| !m.is_paid())
    }

    /// Returns true if at least one milestone is not fully paid.
    pub fn has_pending(&self) -> bool {
        self.next_unpaid().is_some()
    }

    /// Sum of all milestone targets.
    pub fn scheduled_total(&self) -> Money {
        self.milestones.iter().map(|m| m.target_amount).sum()
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Money received against an order. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
}

impl Payment {
    /// Creates a payment with a fresh ID.
    pub fn new(date: DateTime<Utc>, amount: Money, method: PaymentMethod) -> Self {
        Payment {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            amount,
            method,
            note: None,
        }
    }

    /// Attaches a free-text note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Who the order belongs to and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Phone number used by the messaging transport.
    pub contact: String,
}

// =============================================================================
// Original Snapshot
// =============================================================================

/// Pre-lapse state of an order, kept for audit and dispute resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OriginalSnapshot {
    pub total_amount: Money,
    pub gold_rate: f64,
    pub items: Vec<JewelryItem>,
    pub reason: SnapshotReason,
    #[ts(as = "String")]
    pub captured_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// Aggregate root: one customer order with its items, payments and plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer: Customer,
    pub items: Vec<JewelryItem>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Sum of item final amounts.
    pub total_amount: Money,
    /// Old-gold or trade-in credit deducted from the total.
    #[serde(default)]
    pub exchange_credit: Money,
    /// `max(0, total_amount - exchange_credit)`; what the schedule covers.
    pub net_payable: Money,
    pub gold_rate_at_booking: f64,
    pub plan: PaymentPlan,
    #[serde(default)]
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub original_snapshot: Option<OriginalSnapshot>,
}

impl Order {
    /// Sum of all recorded payments.
    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// What is still owed. Negative when overpaid.
    pub fn balance_due(&self) -> Money {
        self.net_payable - self.total_paid()
    }

    /// Returns true if the autopilot should look at this order: it is still
    /// collecting, it has a protected rate, and something is unpaid.
    pub fn is_open(&self) -> bool {
        self.status.is_collecting() && self.plan.protection_enabled && self.plan.has_pending()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(3.0).bps(), 300);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
        assert_eq!(TaxRate::from_percentage(-1.0).bps(), 0);
        assert!((TaxRate::from_bps(300).percentage() - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_protection_transitions_forward_only() {
        use ProtectionStatus::*;
        assert!(Active.can_transition_to(Warning));
        assert!(Active.can_transition_to(Lapsed));
        assert!(Warning.can_transition_to(Lapsed));
        assert!(!Lapsed.can_transition_to(Active));
        assert!(!Lapsed.can_transition_to(Warning));
        assert!(!Warning.can_transition_to(Active));
        assert!(Warning.is_protected());
        assert!(!Lapsed.is_protected());
    }

    #[test]
    fn test_purity_serialization() {
        assert_eq!(serde_json::to_string(&Purity::K22).unwrap(), "\"22K\"");
        let parsed: Purity = serde_json::from_str("\"18K\"").unwrap();
        assert_eq!(parsed, Purity::K18);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&MilestoneStatus::Partial).unwrap(),
            "\"PARTIAL\""
        );
        assert_eq!(
            serde_json::to_string(&SnapshotReason::GracePeriodExpired).unwrap(),
            "\"Grace Period Expired\""
        );
    }

    #[test]
    fn test_milestone_due_at_is_midnight_utc() {
        let milestone = Milestone {
            id: "MS-01".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            target_amount: Money::from_rupees(1000),
            cumulative_target: Money::from_rupees(1000),
            status: MilestoneStatus::Pending,
            warning_count: 0,
        };
        assert_eq!(milestone.due_at().to_rfc3339(), "2026-03-15T00:00:00+00:00");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = StoreSettings::default();
        assert_eq!(settings.grace_period_hours, 24);
        assert_eq!(settings.follow_up_interval_days, 3);
        assert_eq!(settings.warning_spacing_hours, 4);
        assert_eq!(settings.tax_rate().bps(), 300);

        let parsed: StoreSettings =
            serde_json::from_str(r#"{"currentGoldRate24k": 7500.0}"#).unwrap();
        assert_eq!(parsed.purity_factor_22k, 0.916);
    }
}
