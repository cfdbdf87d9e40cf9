//! # goldline-core: Pure Payment-Plan Logic for Goldline
//!
//! This crate holds everything Goldline knows about pricing jewelry,
//! scheduling installments and protecting a customer's booked gold rate.
//! It performs no I/O and never reads the clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Goldline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Back-office UI (out of this workspace)            │   │
//! │  │   Order form ──► Payments ──► Protection desk ──► Messages      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                goldline-autopilot (orchestration)                │   │
//! │  │   OrderBook, Desk, Autopilot job, transport + history seams     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ goldline-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │ pricing  │ │ schedule │ │ projection │ │  protection  │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌──────────────┐    │   │
//! │  │   │repricing │ │autopilot │ │  messages  │ │    order     │    │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • (&Order) -> Order                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Whole-rupee `Money` with half-up rounding
//! - [`types`] - Orders, items, plans, milestones, settings
//! - [`pricing`] - Item price build-up from the 24K rate
//! - [`schedule`] - Installment schedule generation
//! - [`projection`] - Milestone status from total paid; payment recording
//! - [`protection`] - Grace window, lapse, revocation, accept-new-rate
//! - [`repricing`] - Rebuild an order at a new rate; hypothetical quotes
//! - [`autopilot`] - Per-order decision: warn, lapse or quote
//! - [`messages`] - Customer-facing texts for each decision
//! - [`order`] - Order creation and handover
//! - [`validation`] - Submission checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Copy-on-write**: operations take `&Order` and return a new `Order`
//! 2. **Injected time**: `now` is always a parameter
//! 3. **Whole rupees**: every amount passes through `Money::round`
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use goldline_core::money::Money;
//! use goldline_core::schedule::generate_schedule;
//!
//! let start = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
//! let plan = generate_schedule(Money::from_rupees(100000), 10.0, 3, start).unwrap();
//!
//! let targets: Vec<i64> = plan.iter().map(|m| m.target_amount.rupees()).collect();
//! assert_eq!(targets, vec![10000, 30000, 30000, 30000]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod autopilot;
pub mod error;
pub mod messages;
pub mod money;
pub mod order;
pub mod pricing;
pub mod projection;
pub mod protection;
pub mod repricing;
pub mod schedule;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use goldline_core::Money` instead of
// `use goldline_core::money::Money`

pub use autopilot::{decide, record_warning_sent, AutopilotDecision, WarningLevel};
pub use error::{CoreError, CoreResult, ValidationError};
pub use messages::{MessageKind, OutboundMessage};
pub use money::Money;
pub use order::{build_order, OrderDraft};
pub use protection::{evaluate_protection, ProtectionCheck};
pub use repricing::{quote_at_rate, reprice, RepriceQuote};
pub use types::*;
