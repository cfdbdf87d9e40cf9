//! # Validation Module
//!
//! Input validation run before anything is committed to an order.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Order form (frontend)                                        │
//! │  ├── Live pricing of drafts (zero weight allowed while typing)         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Submission (Rust)                                            │
//! │  └── THIS MODULE: weights, rates, plan terms, payment amounts          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pricing / repricing engines                                  │
//! │  └── Refuse zero or non-finite market rates                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Customer, JewelryItem, StoreSettings};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest plan the store offers.
pub const MAX_PLAN_MONTHS: u32 = 36;

// =============================================================================
// Rate Validators
// =============================================================================

/// Validates a rate or factor used in pricing.
///
/// ## Rules
/// - Must be finite
/// - Must be strictly positive
///
/// ## Example
/// ```rust
/// use goldline_core::validation::validate_rate;
///
/// assert!(validate_rate("gold rate (24K)", 7500.0).is_ok());
/// assert!(validate_rate("gold rate (24K)", 0.0).is_err());
/// assert!(validate_rate("gold rate (24K)", f64::NAN).is_err());
/// ```
pub fn validate_rate(field: &str, value: f64) -> CoreResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CoreError::InvalidRate {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// Validates everything pricing needs from settings plus the market rate.
pub fn validate_pricing_inputs(market_rate_24k: f64, settings: &StoreSettings) -> CoreResult<()> {
    validate_rate("gold rate (24K)", market_rate_24k)?;
    validate_rate("22K purity factor", settings.purity_factor_22k)?;
    validate_rate("18K purity factor", settings.purity_factor_18k)?;

    if !settings.default_tax_rate.is_finite() || settings.default_tax_rate < 0.0 {
        return Err(CoreError::InvalidRate {
            field: "tax rate".to_string(),
            value: settings.default_tax_rate,
        });
    }

    Ok(())
}

// =============================================================================
// Item Validators
// =============================================================================

/// Validates an item before it is committed to an order.
///
/// ## Rules
/// - Net weight must be finite and > 0 (drafts may be zero; orders may not)
/// - Wastage %, making charge and stone total must not be negative
pub fn validate_item_for_submission(item: &JewelryItem) -> ValidationResult<()> {
    if !item.net_weight.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "net weight".to_string(),
            reason: "must be a number".to_string(),
        });
    }

    if item.net_weight <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "net weight".to_string(),
        });
    }

    if !item.wastage_pct.is_finite() || item.wastage_pct < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "wastage".to_string(),
        });
    }

    if !item.making_charge_per_gram.is_finite() || item.making_charge_per_gram < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "making charge".to_string(),
        });
    }

    if item.stone_total.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "stone charges".to_string(),
        });
    }

    Ok(())
}

/// Validates the customer identity on an order.
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    if customer.name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if customer.contact.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer contact".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Plan / Payment Validators
// =============================================================================

/// Validates plan terms.
///
/// ## Rules
/// - months between 1 and MAX_PLAN_MONTHS (a zero-month plan would divide
///   by zero when spreading the balance)
/// - advance percentage between 0 and 100
pub fn validate_plan_terms(advance_pct: f64, months: u32) -> ValidationResult<()> {
    if months == 0 || months > MAX_PLAN_MONTHS {
        return Err(ValidationError::OutOfRange {
            field: "plan months".to_string(),
            min: 1,
            max: MAX_PLAN_MONTHS as i64,
        });
    }

    if !advance_pct.is_finite() || !(0.0..=100.0).contains(&advance_pct) {
        return Err(ValidationError::OutOfRange {
            field: "advance percentage".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
