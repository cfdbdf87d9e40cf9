//! # Error Types
//!
//! Domain-specific error types for goldline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  goldline-core errors (this file)                                      │
//! │  ├── CoreError        - Pricing, schedule and order-state failures     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  goldline-autopilot errors (separate crate)                            │
//! │  └── AutopilotError   - Config, transport, sink, cycle failures        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AutopilotError → caller / UI      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order ID, milestone ID, rate)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The market rate or a purity factor cannot be used for pricing.
    ///
    /// ## When This Occurs
    /// - Settings were never loaded (rate is 0)
    /// - A rate feed returned NaN or a negative value
    ///
    /// Repricing against such a rate would silently produce a zero-priced
    /// order, so it is rejected before any item is touched.
    #[error("Invalid {field}: {value}")]
    InvalidRate { field: String, value: f64 },

    /// Plan terms cannot produce a schedule.
    #[error("Invalid payment plan: {reason}")]
    InvalidPlan { reason: String },

    /// The order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Recording a payment against a cancelled order
    /// - Marking a cancelled order as delivered
    #[error("Order {order_id} is {status}, cannot perform operation")]
    OrderClosed { order_id: String, status: String },

    /// An explicit status change is not allowed from the current status.
    ///
    /// ## When This Occurs
    /// - Handing over an order that is not fully paid
    /// - Cancelling an order that was already delivered
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: String,
        to: String,
    },

    /// A milestone referenced by ID does not exist in the plan.
    #[error("Milestone {milestone_id} not found in order {order_id}")]
    MilestoneNotFound {
        order_id: String,
        milestone_id: String,
    },

    /// Generated milestones do not add up to the payable total.
    ///
    /// The remainder-absorption rule makes this impossible; seeing it means
    /// a programming defect, not bad input.
    #[error("Schedule sums to {actual} but payable total is {expected}")]
    ScheduleMismatch { expected: i64, actual: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before an order is committed. Drafts being composed in
/// the UI may hold zero weights; submission may not.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., NaN weight, invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
