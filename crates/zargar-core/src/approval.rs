//! # Approval State Machines
//!
//! The two-tier approval workflow shared by Transactions and Payments,
//! plus the side-effect edge table for payments.
//!
//! ## Why Pure Functions?
//! The engines execute transitions as status-guarded database updates;
//! the decision of WHICH transition is legal, and WHICH side effects a
//! transition carries, lives here where it can be exhaustively unit
//! tested. Side-effect idempotency is structural: every effect is tied
//! to a specific status edge, and an edge that doesn't change status is
//! rejected before any side-effect code runs.

use crate::error::{CoreError, CoreResult};
use crate::types::{ApprovalStatus, PaymentDirection};

// =============================================================================
// Transitions
// =============================================================================

/// Determines the next status when a caller approves.
///
/// - Non-admin: Draft → ApprovedByUser only.
/// - Admin: Draft or ApprovedByUser → ApprovedByAdmin.
/// - Anything else is an invalid state; nothing may be mutated.
pub fn next_approval_status(current: ApprovalStatus, is_admin: bool) -> CoreResult<ApprovalStatus> {
    match (current, is_admin) {
        (ApprovalStatus::Draft, false) => Ok(ApprovalStatus::ApprovedByUser),
        (ApprovalStatus::Draft, true) | (ApprovalStatus::ApprovedByUser, true) => {
            Ok(ApprovalStatus::ApprovedByAdmin)
        }
        (ApprovalStatus::ApprovedByUser, false) => Err(CoreError::invalid_state(
            "already approved; awaiting admin review",
        )),
        (ApprovalStatus::ApprovedByAdmin, _) => {
            Err(CoreError::invalid_state("already approved by an admin"))
        }
    }
}

/// Validates a rejection (always back to Draft).
///
/// - Non-admin: only from ApprovedByUser — a user can retract their own
///   approval, not an admin's.
/// - Admin: from ApprovedByUser or ApprovedByAdmin.
/// - Drafts cannot be rejected.
pub fn check_rejection(current: ApprovalStatus, is_admin: bool) -> CoreResult<()> {
    match current {
        ApprovalStatus::Draft => Err(CoreError::invalid_state("draft records cannot be rejected")),
        ApprovalStatus::ApprovedByUser => Ok(()),
        ApprovalStatus::ApprovedByAdmin => {
            if is_admin {
                Ok(())
            } else {
                Err(CoreError::permission_denied(
                    "only an admin can reject an admin-approved record",
                ))
            }
        }
    }
}

// =============================================================================
// Payment Side-Effect Edges
// =============================================================================

/// Which financial effects one payment status transition carries.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Effect            │ Applied on edge              │ Reversed on edge    │
/// │  ──────────────────┼──────────────────────────────┼──────────────────── │
/// │  Ledger debt       │ first exit from Draft        │ any return to Draft │
/// │  Money balance     │ entering ApprovedByAdmin     │ leaving it          │
/// │  Investment record │ entering ApprovedByAdmin     │ leaving it          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentEffects {
    /// Debit/credit the linked account ledger.
    pub apply_ledger: bool,
    /// Undo a previously applied ledger adjustment.
    pub revert_ledger: bool,
    /// Write a money-balance inventory snapshot.
    pub apply_balance: bool,
    /// Write the reversing money-balance snapshot.
    pub revert_balance: bool,
    /// Create the derived Investment record.
    pub create_investment: bool,
    /// Delete the derived Investment record.
    pub delete_investment: bool,
}

/// Computes the effects of moving a payment from `old` to `new` status.
///
/// Callers must have already validated the transition itself via
/// [`next_approval_status`] / [`check_rejection`]; this function only
/// maps a legal edge to its effects.
pub fn payment_effects(
    old: ApprovalStatus,
    new: ApprovalStatus,
    direction: PaymentDirection,
    has_ledger: bool,
    has_investor: bool,
) -> PaymentEffects {
    let mut effects = PaymentEffects::default();

    let is_approving = new != ApprovalStatus::Draft;
    let first_exit_from_draft = is_approving && old == ApprovalStatus::Draft;
    let any_return_to_draft = !is_approving && old != ApprovalStatus::Draft;
    let entering_admin = new == ApprovalStatus::ApprovedByAdmin && old != ApprovalStatus::ApprovedByAdmin;
    let leaving_admin = old == ApprovalStatus::ApprovedByAdmin && new == ApprovalStatus::Draft;

    if has_ledger {
        effects.apply_ledger = first_exit_from_draft;
        effects.revert_ledger = any_return_to_draft;
    }

    // Internal transfers move debt between parties, never cash.
    if direction != PaymentDirection::InternalTransfer {
        effects.apply_balance = entering_admin;
        effects.revert_balance = leaving_admin;
    }

    if has_investor && direction == PaymentDirection::Incoming {
        effects.create_investment = entering_admin;
        effects.delete_investment = leaving_admin;
    }

    effects
}

/// Signed money-balance delta of a payment, in Rials.
///
/// Incoming adds, Outgoing subtracts, InternalTransfer is always zero.
pub fn money_delta(direction: PaymentDirection, amount: i64) -> i64 {
    match direction {
        PaymentDirection::Incoming => amount,
        PaymentDirection::Outgoing => -amount,
        PaymentDirection::InternalTransfer => 0,
    }
}

/// Signed ledger-debt delta of a payment, in Rials.
///
/// Outgoing and InternalTransfer pay down the debt the shop owes the
/// contact; Incoming payments do not touch the ledger balance.
pub fn ledger_debt_delta(direction: PaymentDirection, amount: i64) -> i64 {
    match direction {
        PaymentDirection::Outgoing | PaymentDirection::InternalTransfer => -amount,
        PaymentDirection::Incoming => 0,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ApprovalStatus::*;
    use PaymentDirection::*;

    #[test]
    fn test_user_approval_path() {
        assert_eq!(next_approval_status(Draft, false).unwrap(), ApprovedByUser);
        assert!(matches!(
            next_approval_status(ApprovedByUser, false),
            Err(CoreError::InvalidState(_))
        ));
        assert!(matches!(
            next_approval_status(ApprovedByAdmin, false),
            Err(CoreError::InvalidState(_))
        ));
    }

    #[test]
    fn test_admin_approval_path() {
        assert_eq!(next_approval_status(Draft, true).unwrap(), ApprovedByAdmin);
        assert_eq!(
            next_approval_status(ApprovedByUser, true).unwrap(),
            ApprovedByAdmin
        );
        // Approving twice in a row must fail before any side effect runs.
        assert!(next_approval_status(ApprovedByAdmin, true).is_err());
    }

    #[test]
    fn test_rejection_rules() {
        assert!(check_rejection(Draft, true).is_err());
        assert!(check_rejection(Draft, false).is_err());
        assert!(check_rejection(ApprovedByUser, false).is_ok());
        assert!(check_rejection(ApprovedByUser, true).is_ok());
        assert!(matches!(
            check_rejection(ApprovedByAdmin, false),
            Err(CoreError::PermissionDenied(_))
        ));
        assert!(check_rejection(ApprovedByAdmin, true).is_ok());
    }

    #[test]
    fn test_ledger_effect_fires_on_first_exit_from_draft_only() {
        let e = payment_effects(Draft, ApprovedByUser, Outgoing, true, false);
        assert!(e.apply_ledger && !e.revert_ledger);

        // Second tier does NOT re-apply the ledger effect.
        let e = payment_effects(ApprovedByUser, ApprovedByAdmin, Outgoing, true, false);
        assert!(!e.apply_ledger && !e.revert_ledger);

        // Any rejection back to draft reverts it.
        let e = payment_effects(ApprovedByUser, Draft, Outgoing, true, false);
        assert!(e.revert_ledger);
        let e = payment_effects(ApprovedByAdmin, Draft, Outgoing, true, false);
        assert!(e.revert_ledger);
    }

    #[test]
    fn test_balance_effect_fires_on_admin_edge_only() {
        let e = payment_effects(Draft, ApprovedByUser, Incoming, false, false);
        assert!(!e.apply_balance);

        let e = payment_effects(Draft, ApprovedByAdmin, Incoming, false, false);
        assert!(e.apply_balance);

        let e = payment_effects(ApprovedByUser, ApprovedByAdmin, Incoming, false, false);
        assert!(e.apply_balance);

        let e = payment_effects(ApprovedByAdmin, Draft, Incoming, false, false);
        assert!(e.revert_balance);

        // Rejection from the user tier never touches the balance.
        let e = payment_effects(ApprovedByUser, Draft, Incoming, false, false);
        assert!(!e.revert_balance);
    }

    #[test]
    fn test_internal_transfer_never_touches_balance() {
        let e = payment_effects(Draft, ApprovedByAdmin, InternalTransfer, true, false);
        assert!(e.apply_ledger);
        assert!(!e.apply_balance);
        let e = payment_effects(ApprovedByAdmin, Draft, InternalTransfer, true, false);
        assert!(e.revert_ledger);
        assert!(!e.revert_balance);
    }

    #[test]
    fn test_investment_effect_requires_incoming_investor() {
        let e = payment_effects(Draft, ApprovedByAdmin, Incoming, false, true);
        assert!(e.create_investment);
        let e = payment_effects(ApprovedByAdmin, Draft, Incoming, false, true);
        assert!(e.delete_investment);

        // Outgoing payments to an investor are withdrawals, not investments.
        let e = payment_effects(Draft, ApprovedByAdmin, Outgoing, false, true);
        assert!(!e.create_investment);
    }

    #[test]
    fn test_money_and_debt_deltas() {
        assert_eq!(money_delta(Incoming, 500), 500);
        assert_eq!(money_delta(Outgoing, 500), -500);
        assert_eq!(money_delta(InternalTransfer, 500), 0);

        assert_eq!(ledger_debt_delta(Outgoing, 500), -500);
        assert_eq!(ledger_debt_delta(InternalTransfer, 500), -500);
        assert_eq!(ledger_debt_delta(Incoming, 500), 0);
    }
}
