//! # Pricing Formula
//!
//! Per-item total price and transaction-level aggregation.
//!
//! ## The Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  wage_per_unit      = unit_price * (ojrat / 100)                        │
//! │  price_after_wage   = unit_price + wage_per_unit                        │
//! │  profit_per_unit    = price_after_wage * (profit / 100)                 │
//! │  price_after_profit = price_after_wage + profit_per_unit                │
//! │  net_price          = unit_price * weight_count                         │
//! │  gross_price        = price_after_profit * weight_count                 │
//! │  tax_amount         = (gross_price - net_price) * (tax / 100)           │
//! │  total_price        = trunc(gross_price + tax_amount)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The formula is direction-agnostic: BUY vs SELL only flips the SIGN
//! with which an item's total contributes to the parent transaction,
//! never the per-item arithmetic. The final value is truncated toward
//! zero (not rounded) — downstream books were reconciled against that
//! behavior, so it must be reproduced exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::{TransactionItem, TransactionType};

/// Computes a line item's total price in Rials.
///
/// Percentage fields are whole percentages (9.0 means 9%); absent
/// percentages count as zero.
pub fn item_total_price(
    unit_price: i64,
    weight_count: Decimal,
    ojrat: Option<Decimal>,
    profit: Option<Decimal>,
    tax: Option<Decimal>,
) -> i64 {
    let hundred = Decimal::from(100);
    let unit_price = Decimal::from(unit_price);
    let ojrat = ojrat.unwrap_or(Decimal::ZERO) / hundred;
    let profit = profit.unwrap_or(Decimal::ZERO) / hundred;
    let tax = tax.unwrap_or(Decimal::ZERO) / hundred;

    let wage_per_unit = unit_price * ojrat;
    let price_after_wage = unit_price + wage_per_unit;
    let profit_per_unit = price_after_wage * profit;
    let price_after_profit = price_after_wage + profit_per_unit;

    let net_price = unit_price * weight_count;
    let gross_price = price_after_profit * weight_count;

    let tax_amount = (gross_price - net_price) * tax;

    let total_price = gross_price + tax_amount;
    // Truncate toward zero. Inputs are validated non-negative, so this
    // can only fail on absurd magnitudes; saturate rather than wrap.
    total_price.trunc().to_i64().unwrap_or(i64::MAX)
}

/// A line item's signed contribution to the parent transaction's total:
/// SELL adds, BUY subtracts.
pub fn signed_item_total(item: &TransactionItem) -> i64 {
    match item.transaction_type {
        TransactionType::Sell => item.total_price,
        TransactionType::Buy => -item.total_price,
    }
}

/// Recomputes a transaction's total price from the full current item
/// set. Always computed from scratch — incremental patching drifts.
pub fn transaction_total(items: &[TransactionItem], discount: i64) -> i64 {
    items.iter().map(signed_item_total).sum::<i64>() - discount
}

/// A line item's signed inventory quantity delta on admin approval:
/// BUY increases the shop's holding, SELL decreases it.
pub fn signed_quantity(transaction_type: TransactionType, weight_count: Decimal) -> Decimal {
    match transaction_type {
        TransactionType::Buy => weight_count,
        TransactionType::Sell => -weight_count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn item(transaction_type: TransactionType, total_price: i64) -> TransactionItem {
        let now = Utc::now();
        TransactionItem {
            id: "i".into(),
            transaction_id: "t".into(),
            item_id: "a".into(),
            transaction_type,
            title: "test".into(),
            weight_count: Decimal::ONE,
            unit_price: 0,
            total_price,
            karat: None,
            ojrat: None,
            profit: None,
            tax: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reference vector: wage=100 → 1100; profit=55 → 1155; gross=2310;
    /// net=2000; tax=310*0.09=27.9; total=2337.9 → trunc 2337.
    #[test]
    fn test_reference_vector_with_all_percentages() {
        let total = item_total_price(
            1000,
            Decimal::from(2),
            Some(Decimal::from_str("10.0").unwrap()),
            Some(Decimal::from_str("5.0").unwrap()),
            Some(Decimal::from_str("9.0").unwrap()),
        );
        assert_eq!(total, 2337);
    }

    #[test]
    fn test_reference_vector_no_percentages() {
        let total = item_total_price(500, Decimal::from(10), None, None, None);
        assert_eq!(total, 5000);
    }

    #[test]
    fn test_zero_percentages_equal_absent() {
        let explicit = item_total_price(
            750,
            Decimal::from_str("3.5").unwrap(),
            Some(Decimal::ZERO),
            Some(Decimal::ZERO),
            Some(Decimal::ZERO),
        );
        let absent = item_total_price(750, Decimal::from_str("3.5").unwrap(), None, None, None);
        assert_eq!(explicit, absent);
        assert_eq!(explicit, 2625);
    }

    #[test]
    fn test_truncates_toward_zero_not_rounds() {
        // gross = 1000 * 1.01 * 1 = 1010, net = 1000, tax = 10 * 0.99 = 9.9
        // total = 1019.9 → 1019, not 1020
        let total = item_total_price(
            1000,
            Decimal::ONE,
            Some(Decimal::from(1)),
            None,
            Some(Decimal::from(99)),
        );
        assert_eq!(total, 1019);
    }

    #[test]
    fn test_transaction_total_signs_and_discount() {
        let items = vec![
            item(TransactionType::Sell, 5000),
            item(TransactionType::Buy, 1200),
            item(TransactionType::Sell, 300),
        ];
        assert_eq!(transaction_total(&items, 0), 4100);
        assert_eq!(transaction_total(&items, 500), 3600);
        // A transaction can owe the contact money overall.
        let items = vec![item(TransactionType::Buy, 9000)];
        assert_eq!(transaction_total(&items, 0), -9000);
    }

    #[test]
    fn test_empty_transaction_total_is_negative_discount() {
        assert_eq!(transaction_total(&[], 250), -250);
    }

    #[test]
    fn test_signed_quantity() {
        let w = Decimal::from_str("4.25").unwrap();
        assert_eq!(signed_quantity(TransactionType::Buy, w), w);
        assert_eq!(signed_quantity(TransactionType::Sell, w), -w);
    }
}
