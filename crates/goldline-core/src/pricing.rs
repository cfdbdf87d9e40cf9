//! # Item Pricing
//!
//! Prices one jewelry item against a 24K market rate.
//!
//! ## Price Build-up
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rate (by purity) = 24K rate × purity factor                            │
//! │                                                                         │
//! │  metal    = round(net weight × rate)                                    │
//! │  wastage  = round(metal × wastage% / 100)                               │
//! │  labor    = round(making charge/g × net weight)                         │
//! │  subtotal = metal + wastage + labor + stones                            │
//! │  tax      = round(subtotal × tax% / 100)                                │
//! │  final    = subtotal + tax                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step is rounded to whole rupees before the next one uses it, so
//! pricing the same item twice always yields identical numbers.

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{JewelryItem, Purity, StoreSettings};
use crate::validation::validate_pricing_inputs;

/// Resolves the per-gram rate for a purity from the 24K rate.
pub fn effective_rate(purity: Purity, market_rate_24k: f64, settings: &StoreSettings) -> f64 {
    match purity {
        Purity::K24 => market_rate_24k,
        Purity::K22 => market_rate_24k * settings.purity_factor_22k,
        Purity::K18 => market_rate_24k * settings.purity_factor_18k,
    }
}

/// Prices an item, returning a copy with every computed field rewritten.
///
/// Pure and infallible so the order form can price drafts as the user
/// types. A zero weight prices metal, wastage and labor at zero.
///
/// ## Example
/// ```rust
/// use goldline_core::money::Money;
/// use goldline_core::pricing::price_item;
/// use goldline_core::types::{JewelryItem, Purity, StoreSettings};
///
/// let settings = StoreSettings { current_gold_rate_24k: 7500.0, ..Default::default() };
/// let item = JewelryItem::new("Chain", Purity::K22, 10.0, 12.0, 450.0, Money::zero());
///
/// let priced = price_item(&item, 7500.0, &settings);
/// assert_eq!(priced.final_amount.rupees(), 83887);
/// ```
pub fn price_item(item: &JewelryItem, market_rate_24k: f64, settings: &StoreSettings) -> JewelryItem {
    let rate = effective_rate(item.purity, market_rate_24k, settings);

    let metal_value = Money::round(item.net_weight * rate);
    let wastage_value = metal_value.percent(item.wastage_pct);
    let labor_value = Money::round(item.making_charge_per_gram * item.net_weight);
    let subtotal = metal_value + wastage_value + labor_value + item.stone_total;
    let tax = subtotal.calculate_tax(settings.tax_rate());

    JewelryItem {
        metal_value,
        wastage_value,
        labor_value,
        tax,
        final_amount: subtotal + tax,
        ..item.clone()
    }
}

/// Prices every item after checking the rate and settings are usable.
///
/// This is the entry point for anything that commits prices to an order:
/// a zero or missing rate must never produce a zero-priced order.
pub fn price_items(
    items: &[JewelryItem],
    market_rate_24k: f64,
    settings: &StoreSettings,
) -> CoreResult<Vec<JewelryItem>> {
    validate_pricing_inputs(market_rate_24k, settings)?;

    Ok(items
        .iter()
        .map(|item| price_item(item, market_rate_24k, settings))
        .collect())
}

/// Sum of the final amounts of `items`.
pub fn items_total(items: &[JewelryItem]) -> Money {
    items.iter().map(|item| item.final_amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn settings() -> StoreSettings {
        StoreSettings {
            current_gold_rate_24k: 7500.0,
            purity_factor_22k: 0.916,
            purity_factor_18k: 0.75,
            default_tax_rate: 3.0,
            ..StoreSettings::default()
        }
    }

    #[test]
    fn test_22k_item_breakdown() {
        let item = JewelryItem::new("Necklace", Purity::K22, 10.0, 12.0, 450.0, Money::zero());
        let priced = price_item(&item, 7500.0, &settings());

        assert_eq!(priced.metal_value.rupees(), 68700);
        assert_eq!(priced.wastage_value.rupees(), 8244);
        assert_eq!(priced.labor_value.rupees(), 4500);
        assert_eq!(priced.tax.rupees(), 2443);
        assert_eq!(priced.final_amount.rupees(), 83887);
    }

    #[test]
    fn test_purity_rates() {
        let s = settings();
        assert_eq!(effective_rate(Purity::K24, 7500.0, &s), 7500.0);
        assert_eq!(effective_rate(Purity::K18, 7500.0, &s), 5625.0);
        assert!((effective_rate(Purity::K22, 7500.0, &s) - 6870.0).abs() < 1e-6);
    }

    #[test]
    fn test_stones_are_taxed() {
        let item = JewelryItem::new("Ring", Purity::K18, 2.0, 0.0, 0.0, Money::from_rupees(10000));
        let priced = price_item(&item, 7500.0, &settings());

        // metal 11250 + stones 10000 = 21250, tax 637.5 → 638
        assert_eq!(priced.metal_value.rupees(), 11250);
        assert_eq!(priced.tax.rupees(), 638);
        assert_eq!(priced.final_amount.rupees(), 21888);
    }

    #[test]
    fn test_zero_weight_draft_prices_to_zero() {
        let draft = JewelryItem::new("Bangle", Purity::K22, 0.0, 12.0, 450.0, Money::zero());
        let priced = price_item(&draft, 7500.0, &settings());
        assert!(priced.final_amount.is_zero());
        assert!(priced.metal_value.is_zero());
    }

    #[test]
    fn test_repricing_overwrites_all_computed_fields() {
        let item = JewelryItem::new("Chain", Purity::K24, 5.0, 10.0, 300.0, Money::zero());
        let first = price_item(&item, 7000.0, &settings());
        let second = price_item(&first, 8000.0, &settings());
        let direct = price_item(&item, 8000.0, &settings());

        assert_eq!(second, direct);
        assert_eq!(second.category, "Chain");
        assert_eq!(second.net_weight, 5.0);
    }

    #[test]
    fn test_price_items_rejects_zero_rate() {
        let items = vec![JewelryItem::new("Chain", Purity::K22, 10.0, 12.0, 450.0, Money::zero())];
        let result = price_items(&items, 0.0, &settings());
        assert!(matches!(result, Err(CoreError::InvalidRate { .. })));
    }

    #[test]
    fn test_items_total() {
        let s = settings();
        let items = price_items(
            &[
                JewelryItem::new("Chain", Purity::K22, 10.0, 12.0, 450.0, Money::zero()),
                JewelryItem::new("Ring", Purity::K18, 2.0, 0.0, 0.0, Money::from_rupees(10000)),
            ],
            7500.0,
            &s,
        )
        .unwrap();
        assert_eq!(items_total(&items).rupees(), 83887 + 21888);
    }
}
