//! # Structural Validation
//!
//! Pure validation rules the engines run BEFORE opening a database
//! transaction. Everything here answers "is this request well-formed"
//! from the request's own fields; existence and status checks belong to
//! the engines, which hold the rows.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::principal::Principal;
use crate::types::{MeasurementKind, PaymentDirection};

// =============================================================================
// Payment Settlement Targets
// =============================================================================

/// The settlement-target links of a payment request, before resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementLinks<'a> {
    pub investor_id: Option<&'a str>,
    pub transaction_id: Option<&'a str>,
    pub account_ledger_id: Option<&'a str>,
    pub saved_bank_account_id: Option<&'a str>,
}

impl SettlementLinks<'_> {
    fn count(&self) -> usize {
        [
            self.investor_id.is_some(),
            self.transaction_id.is_some(),
            self.account_ledger_id.is_some(),
            self.saved_bank_account_id.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

/// Checks the settlement-target rule for a payment.
///
/// ## Rules
/// - Exactly ONE of investor / transaction / ledger / bank account.
/// - INTERNAL_TRANSFER must settle against an account ledger — it moves
///   debt, so there must be a debt record to move it on.
pub fn check_settlement_links(
    direction: PaymentDirection,
    links: &SettlementLinks<'_>,
) -> CoreResult<()> {
    match links.count() {
        0 => {
            return Err(CoreError::validation(
                "payment must reference exactly one of: investor, transaction, \
                 account ledger, bank account (none given)",
            ))
        }
        1 => {}
        n => {
            return Err(CoreError::validation(format!(
                "payment must reference exactly one settlement target, got {n}"
            )))
        }
    }

    if direction == PaymentDirection::InternalTransfer && links.account_ledger_id.is_none() {
        return Err(CoreError::validation(
            "internal transfers must settle against an account ledger",
        ));
    }

    Ok(())
}

/// Positive-amount rule shared by payments and ledger debts.
pub fn check_positive_amount(amount: i64) -> CoreResult<()> {
    if amount > 0 {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "amount must be positive, got {amount}"
        )))
    }
}

/// Checks a payment amount against the linked ledger's outstanding debt.
///
/// An OUTGOING or INTERNAL_TRANSFER payment cannot settle more than the
/// shop actually owes. INCOMING payments against a ledger are exempt:
/// the contact may hand over more than the recorded debt.
pub fn check_ledger_amount(
    direction: PaymentDirection,
    amount: i64,
    ledger_debt: i64,
) -> CoreResult<()> {
    if direction != PaymentDirection::Incoming && amount > ledger_debt {
        return Err(CoreError::validation(format!(
            "payment amount {amount} exceeds outstanding ledger debt {ledger_debt}"
        )));
    }
    Ok(())
}

/// Non-admins may only name themselves as the receipt photo holder.
pub fn check_photo_holder(principal: &Principal, photo_holder_id: Option<&str>) -> CoreResult<()> {
    if let Some(holder) = photo_holder_id {
        if !principal.is_admin() && holder != principal.user_id {
            return Err(CoreError::permission_denied(
                "only an admin can assign the photo holder to another user",
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Transaction Items
// =============================================================================

/// Checks a line item's quantity against the item's measurement kind.
///
/// Countable items trade in whole units; every item needs a positive
/// quantity.
pub fn check_weight_count(measurement: MeasurementKind, weight_count: Decimal) -> CoreResult<()> {
    if weight_count <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "weight/count must be positive, got {weight_count}"
        )));
    }
    if measurement == MeasurementKind::Countable && weight_count.fract() != Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "countable items require a whole-number count, got {weight_count}"
        )));
    }
    Ok(())
}

/// Percentage fields must be non-negative when present.
pub fn check_percentage(name: &str, value: Option<Decimal>) -> CoreResult<()> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(CoreError::validation(format!(
            "{name} must be non-negative, got {v}"
        ))),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use std::str::FromStr;

    #[test]
    fn test_exactly_one_settlement_target() {
        let none = SettlementLinks::default();
        assert!(check_settlement_links(PaymentDirection::Incoming, &none).is_err());

        let one = SettlementLinks {
            transaction_id: Some("t1"),
            ..Default::default()
        };
        assert!(check_settlement_links(PaymentDirection::Incoming, &one).is_ok());

        let two = SettlementLinks {
            transaction_id: Some("t1"),
            account_ledger_id: Some("l1"),
            ..Default::default()
        };
        assert!(check_settlement_links(PaymentDirection::Incoming, &two).is_err());
    }

    #[test]
    fn test_internal_transfer_requires_ledger() {
        let bank = SettlementLinks {
            saved_bank_account_id: Some("b1"),
            ..Default::default()
        };
        assert!(check_settlement_links(PaymentDirection::InternalTransfer, &bank).is_err());

        let ledger = SettlementLinks {
            account_ledger_id: Some("l1"),
            ..Default::default()
        };
        assert!(check_settlement_links(PaymentDirection::InternalTransfer, &ledger).is_ok());
    }

    #[test]
    fn test_ledger_amount_rule() {
        assert!(check_ledger_amount(PaymentDirection::Outgoing, 500, 1000).is_ok());
        assert!(check_ledger_amount(PaymentDirection::Outgoing, 1001, 1000).is_err());
        assert!(check_ledger_amount(PaymentDirection::InternalTransfer, 1001, 1000).is_err());
        // Incoming payments may exceed the recorded debt.
        assert!(check_ledger_amount(PaymentDirection::Incoming, 99_999, 1000).is_ok());
    }

    #[test]
    fn test_photo_holder_rule() {
        let admin = Principal::new("a1", Role::Admin, vec![]);
        let user = Principal::new("u1", Role::User, vec![]);

        assert!(check_photo_holder(&user, None).is_ok());
        assert!(check_photo_holder(&user, Some("u1")).is_ok());
        assert!(check_photo_holder(&user, Some("u2")).is_err());
        assert!(check_photo_holder(&admin, Some("u2")).is_ok());
    }

    #[test]
    fn test_weight_count_rules() {
        let frac = Decimal::from_str("2.5").unwrap();
        assert!(check_weight_count(MeasurementKind::Uncountable, frac).is_ok());
        assert!(check_weight_count(MeasurementKind::Countable, frac).is_err());
        assert!(check_weight_count(MeasurementKind::Countable, Decimal::from(3)).is_ok());
        assert!(check_weight_count(MeasurementKind::Uncountable, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_positive_amount_and_percentage() {
        assert!(check_positive_amount(1).is_ok());
        assert!(check_positive_amount(0).is_err());
        assert!(check_positive_amount(-5).is_err());

        assert!(check_percentage("tax", None).is_ok());
        assert!(check_percentage("tax", Some(Decimal::from(9))).is_ok());
        assert!(check_percentage("tax", Some(Decimal::from(-1))).is_err());
    }
}
