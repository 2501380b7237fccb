//! # Payment Engine
//!
//! Owns the Payment aggregate: settlement-target validation, the
//! two-tier approval state machine, and the ledger-debt / money-balance
//! / investment side effects of approval and rejection.
//!
//! ## Side-Effect Edges
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            approve(user)                 approve(admin)                 │
//! │   Draft ───────────────► ApprovedByUser ───────────────► ApprovedByAdmin│
//! │     │   ledger debt applied │                 money balance + investment│
//! │     │   (first exit only)   │                 applied (admin edge only) │
//! │     ▲                       │                              │            │
//! │     └───────────────────────┴──────────────────────────────┘            │
//! │          reject: ledger reverted on ANY return to Draft;                │
//! │          balance/investment reverted only when leaving ApprovedByAdmin  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The edge table itself lives in `zargar_core::approval`; this engine
//! executes it under one status-guarded database transaction so a
//! concurrent double-approve loses the race before any side effect.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::repository::account_ledger::{adjust_debt_on, AccountLedgerRepository};
use crate::repository::contact::ContactRepository;
use crate::repository::inventory::{append_snapshot, SnapshotDelta};
use crate::repository::investor::{create_investment_on, delete_investment_on, InvestorRepository};
use crate::repository::saved_bank_account::SavedBankAccountRepository;
use crate::repository::user::UserRepository;
use crate::row::map_payment;
use zargar_core::validation::{
    check_ledger_amount, check_photo_holder, check_positive_amount, check_settlement_links,
    SettlementLinks,
};
use zargar_core::{
    approval, authorize, Access, ApprovalStatus, Payment, PaymentDirection, PaymentMethod,
    Principal,
};

/// Input for creating (or fully replacing the mutable fields of) a
/// payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub direction: PaymentDirection,
    pub description: Option<String>,
    pub photo_holder_id: Option<String>,
    pub investor_id: Option<String>,
    pub transaction_id: Option<String>,
    pub account_ledger_id: Option<String>,
    pub saved_bank_account_id: Option<String>,
    pub contact_id: Option<String>,
}

/// Search filters. Non-admins are pinned to their own records.
#[derive(Debug, Clone, Default)]
pub struct PaymentSearch {
    pub recorder_id: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub direction: Option<PaymentDirection>,
    pub payment_method: Option<PaymentMethod>,
    pub contact_id: Option<String>,
    pub account_ledger_id: Option<String>,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub created_after: Option<chrono::DateTime<Utc>>,
    pub created_before: Option<chrono::DateTime<Utc>>,
    /// When set, order by closeness to this amount (reconciliation
    /// workflow) instead of newest-first.
    pub near_amount: Option<i64>,
    pub skip: i64,
    pub limit: i64,
}

/// Engine for the payment aggregate.
#[derive(Debug, Clone)]
pub struct PaymentEngine {
    pool: SqlitePool,
}

impl PaymentEngine {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentEngine { pool }
    }

    // =========================================================================
    // Draft CRUD
    // =========================================================================

    /// Creates a new draft payment after full structural validation.
    pub async fn create(&self, principal: &Principal, input: PaymentInput) -> DbResult<Payment> {
        self.validate_input(principal, &input).await?;

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            recorder_id: principal.user_id.clone(),
            amount: input.amount,
            payment_method: input.payment_method,
            direction: input.direction,
            description: input.description,
            photo_holder_id: input.photo_holder_id,
            status: ApprovalStatus::Draft,
            investor_id: input.investor_id,
            transaction_id: input.transaction_id,
            account_ledger_id: input.account_ledger_id,
            saved_bank_account_id: input.saved_bank_account_id,
            contact_id: input.contact_id,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %payment.id, amount = payment.amount, direction = %payment.direction.as_str(), "Creating payment");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, recorder_id, amount, payment_method, direction,
                description, photo_holder_id, status,
                investor_id, transaction_id, account_ledger_id, saved_bank_account_id,
                contact_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.recorder_id)
        .bind(payment.amount)
        .bind(payment.payment_method.as_str())
        .bind(payment.direction.as_str())
        .bind(&payment.description)
        .bind(&payment.photo_holder_id)
        .bind(payment.status.as_str())
        .bind(&payment.investor_id)
        .bind(&payment.transaction_id)
        .bind(&payment.account_ledger_id)
        .bind(&payment.saved_bank_account_id)
        .bind(&payment.contact_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "payments", &payment).await?;
        tx.commit().await?;

        Ok(payment)
    }

    /// Replaces a draft payment's mutable fields. Re-runs the full
    /// creation-time validation against the new state.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        input: PaymentInput,
    ) -> DbResult<Payment> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&before)?;

        self.validate_input(principal, &input).await?;

        let mut after = before.clone();
        after.amount = input.amount;
        after.payment_method = input.payment_method;
        after.direction = input.direction;
        after.description = input.description;
        after.photo_holder_id = input.photo_holder_id;
        after.investor_id = input.investor_id;
        after.transaction_id = input.transaction_id;
        after.account_ledger_id = input.account_ledger_id;
        after.saved_bank_account_id = input.saved_bank_account_id;
        after.contact_id = input.contact_id;
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET amount = ?2, payment_method = ?3, direction = ?4, description = ?5,
                photo_holder_id = ?6, investor_id = ?7, transaction_id = ?8,
                account_ledger_id = ?9, saved_bank_account_id = ?10, contact_id = ?11,
                updated_at = ?12
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(id)
        .bind(after.amount)
        .bind(after.payment_method.as_str())
        .bind(after.direction.as_str())
        .bind(&after.description)
        .bind(&after.photo_holder_id)
        .bind(&after.investor_id)
        .bind(&after.transaction_id)
        .bind(&after.account_ledger_id)
        .bind(&after.saved_bank_account_id)
        .bind(&after.contact_id)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("only draft payments can be updated"));
        }

        audit::record_update(&mut tx, &principal.user_id, "payments", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Deletes a draft payment.
    pub async fn delete(&self, principal: &Principal, id: &str) -> DbResult<()> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&before)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1 AND status = 'draft'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state("only draft payments can be deleted"));
        }

        audit::record_delete(&mut tx, &principal.user_id, "payments", &before).await?;
        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // State Machine
    // =========================================================================

    /// Approves one tier and applies the side effects that belong to
    /// the traversed edge.
    pub async fn approve(&self, principal: &Principal, id: &str) -> DbResult<Payment> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;

        let next = approval::next_approval_status(before.status, principal.is_admin())
            .map_err(DbError::Domain)?;

        let mut tx = self.pool.begin().await?;
        guarded_status_flip(&mut tx, id, before.status, next).await?;
        self.apply_effects(&mut tx, &before, next).await?;

        let mut after = before.clone();
        after.status = next;
        after.updated_at = Utc::now();

        audit::record_update(&mut tx, &principal.user_id, "payments", &before, &after).await?;
        tx.commit().await?;

        info!(id = %id, status = %next.as_str(), "Payment approved");
        Ok(after)
    }

    /// Rejects back to draft, reverting whatever the forward edges had
    /// applied.
    pub async fn reject(&self, principal: &Principal, id: &str) -> DbResult<Payment> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;

        approval::check_rejection(before.status, principal.is_admin()).map_err(DbError::Domain)?;

        let mut tx = self.pool.begin().await?;
        guarded_status_flip(&mut tx, id, before.status, ApprovalStatus::Draft).await?;
        self.apply_effects(&mut tx, &before, ApprovalStatus::Draft).await?;

        let mut after = before.clone();
        after.status = ApprovalStatus::Draft;
        after.updated_at = Utc::now();

        audit::record_update(&mut tx, &principal.user_id, "payments", &before, &after).await?;
        tx.commit().await?;

        info!(id = %id, "Payment rejected");
        Ok(after)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Permission-checked fetch: non-admins see only their own records.
    pub async fn get(&self, principal: &Principal, id: &str) -> DbResult<Payment> {
        let payment = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&payment.recorder_id))
            .map_err(DbError::Domain)?;
        Ok(payment)
    }

    /// Role-scoped search with amount-proximity ordering.
    pub async fn search(&self, principal: &Principal, filter: &PaymentSearch) -> DbResult<Vec<Payment>> {
        let recorder_id = if principal.is_admin() {
            filter.recorder_id.clone()
        } else {
            Some(principal.user_id.clone())
        };
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };
        let description_pattern = filter.description.as_ref().map(|d| format!("%{d}%"));

        let rows = sqlx::query(
            r#"
            SELECT * FROM payments
            WHERE (?1 IS NULL OR recorder_id = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR direction = ?3)
              AND (?4 IS NULL OR payment_method = ?4)
              AND (?5 IS NULL OR contact_id = ?5)
              AND (?6 IS NULL OR account_ledger_id = ?6)
              AND (?7 IS NULL OR transaction_id = ?7)
              AND (?8 IS NULL OR description LIKE ?8)
              AND (?9 IS NULL OR created_at >= ?9)
              AND (?10 IS NULL OR created_at <= ?10)
            ORDER BY
                CASE WHEN ?11 IS NOT NULL THEN abs(amount - ?11) END ASC,
                created_at DESC, id DESC
            LIMIT ?12 OFFSET ?13
            "#,
        )
        .bind(&recorder_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.direction.map(|d| d.as_str()))
        .bind(filter.payment_method.map(|m| m.as_str()))
        .bind(&filter.contact_id)
        .bind(&filter.account_ledger_id)
        .bind(&filter.transaction_id)
        .bind(&description_pattern)
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(filter.near_amount)
        .bind(limit)
        .bind(filter.skip.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_payment).collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn get_unchecked(&self, id: &str) -> DbResult<Payment> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_payment)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Payment", id))
    }

    /// Creation-time validation: structural rules first, then foreign
    /// keys, then the ledger-debt rule. Nothing is mutated on failure.
    async fn validate_input(&self, principal: &Principal, input: &PaymentInput) -> DbResult<()> {
        check_positive_amount(input.amount).map_err(DbError::Domain)?;

        let links = SettlementLinks {
            investor_id: input.investor_id.as_deref(),
            transaction_id: input.transaction_id.as_deref(),
            account_ledger_id: input.account_ledger_id.as_deref(),
            saved_bank_account_id: input.saved_bank_account_id.as_deref(),
        };
        check_settlement_links(input.direction, &links).map_err(DbError::Domain)?;
        check_photo_holder(principal, input.photo_holder_id.as_deref()).map_err(DbError::Domain)?;

        if let Some(photo_holder_id) = &input.photo_holder_id {
            UserRepository::new(self.pool.clone())
                .get_or_404(photo_holder_id)
                .await?;
        }
        if let Some(investor_id) = &input.investor_id {
            InvestorRepository::new(self.pool.clone())
                .get_or_404(investor_id)
                .await?;
        }
        if let Some(transaction_id) = &input.transaction_id {
            let row = sqlx::query("SELECT id FROM transactions WHERE id = ?1")
                .bind(transaction_id)
                .fetch_optional(&self.pool)
                .await?;
            if row.is_none() {
                return Err(DbError::not_found("Transaction", transaction_id));
            }
        }
        if let Some(bank_account_id) = &input.saved_bank_account_id {
            SavedBankAccountRepository::new(self.pool.clone())
                .get_or_404(bank_account_id)
                .await?;
        }
        if let Some(contact_id) = &input.contact_id {
            ContactRepository::new(self.pool.clone())
                .get_or_404(contact_id)
                .await?;
        }
        if let Some(ledger_id) = &input.account_ledger_id {
            let ledger = AccountLedgerRepository::new(self.pool.clone())
                .get_or_404(ledger_id)
                .await?;
            check_ledger_amount(input.direction, input.amount, ledger.debt)
                .map_err(DbError::Domain)?;
        }

        Ok(())
    }

    /// Applies the side effects of the `payment.status → new` edge on
    /// the caller's transaction handle.
    async fn apply_effects(
        &self,
        tx: &mut SqliteConnection,
        payment: &Payment,
        new: ApprovalStatus,
    ) -> DbResult<()> {
        let effects = approval::payment_effects(
            payment.status,
            new,
            payment.direction,
            payment.account_ledger_id.is_some(),
            payment.investor_id.is_some(),
        );

        if let Some(ledger_id) = &payment.account_ledger_id {
            let debt_delta = approval::ledger_debt_delta(payment.direction, payment.amount);
            if effects.apply_ledger {
                adjust_debt_on(&mut *tx, ledger_id, debt_delta).await?;
            }
            if effects.revert_ledger {
                adjust_debt_on(&mut *tx, ledger_id, -debt_delta).await?;
            }
        }

        let money = approval::money_delta(payment.direction, payment.amount);
        if effects.apply_balance {
            append_snapshot(&mut *tx, &SnapshotDelta::for_payment(&payment.id, money)).await?;
        }
        if effects.revert_balance {
            append_snapshot(&mut *tx, &SnapshotDelta::for_payment(&payment.id, -money)).await?;
        }

        if effects.create_investment {
            let investor_id = payment
                .investor_id
                .as_deref()
                .ok_or_else(|| DbError::Internal("investment effect without investor".into()))?;
            create_investment_on(&mut *tx, investor_id, &payment.id, payment.amount).await?;
        }
        if effects.delete_investment {
            delete_investment_on(&mut *tx, &payment.id).await?;
        }

        Ok(())
    }
}

/// Status-guarded UPDATE shared by approve/reject: a concurrent writer
/// loses the race here, before any side effect code runs.
async fn guarded_status_flip(
    conn: &mut SqliteConnection,
    id: &str,
    old: ApprovalStatus,
    new: ApprovalStatus,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE payments SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
    )
    .bind(id)
    .bind(old.as_str())
    .bind(new.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::invalid_state(format!(
            "payment {id} was modified concurrently; expected status '{}'",
            old.as_str()
        )));
    }
    Ok(())
}

fn require_draft(payment: &Payment) -> DbResult<()> {
    if payment.status != ApprovalStatus::Draft {
        return Err(DbError::invalid_state(format!(
            "payment {} is '{}'; only drafts can be edited",
            payment.id,
            payment.status.as_str()
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use zargar_core::Role;

    async fn setup() -> (Database, Principal, Principal) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin_user = db
            .users()
            .bootstrap_admin("admin", "argon2-hash")
            .await
            .unwrap();
        let admin = db.users().load_principal(&admin_user.id).await.unwrap();
        let staff_user = db
            .users()
            .create(&admin_user.id, "staff", "argon2-hash", Role::User)
            .await
            .unwrap();
        let staff = db.users().load_principal(&staff_user.id).await.unwrap();
        (db, admin, staff)
    }

    async fn seed_contact(db: &Database, admin: &Principal) -> String {
        db.contacts()
            .create(admin, "Ali Rezaei", "customer", None, None)
            .await
            .unwrap()
            .id
    }

    async fn seed_ledger(db: &Database, admin: &Principal, contact_id: &str, debt: i64) -> String {
        db.account_ledgers()
            .create(admin, contact_id, None, debt, None, None, None, None)
            .await
            .unwrap()
            .id
    }

    fn bank_input(bank_account_id: &str, direction: PaymentDirection, amount: i64) -> PaymentInput {
        PaymentInput {
            amount,
            payment_method: PaymentMethod::CardTransaction,
            direction,
            description: None,
            photo_holder_id: None,
            investor_id: None,
            transaction_id: None,
            account_ledger_id: None,
            saved_bank_account_id: Some(bank_account_id.to_string()),
            contact_id: None,
        }
    }

    fn ledger_input(ledger_id: &str, direction: PaymentDirection, amount: i64) -> PaymentInput {
        PaymentInput {
            amount,
            payment_method: PaymentMethod::Cash,
            direction,
            description: None,
            photo_holder_id: None,
            investor_id: None,
            transaction_id: None,
            account_ledger_id: Some(ledger_id.to_string()),
            saved_bank_account_id: None,
            contact_id: None,
        }
    }

    #[tokio::test]
    async fn test_settlement_target_must_be_exactly_one() {
        let (db, admin, _) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 1_000).await;
        let engine = db.payments();

        // No target at all.
        let mut input = ledger_input(&ledger_id, PaymentDirection::Incoming, 100);
        input.account_ledger_id = None;
        assert!(engine.create(&admin, input).await.is_err());

        // Two targets at once.
        let bank = db
            .bank_accounts()
            .create(&admin, None, "Melli", None, None, None)
            .await
            .unwrap();
        let mut input = ledger_input(&ledger_id, PaymentDirection::Incoming, 100);
        input.saved_bank_account_id = Some(bank.id.clone());
        assert!(engine.create(&admin, input).await.is_err());

        // Internal transfers must settle against a ledger.
        let input = bank_input(&bank.id, PaymentDirection::InternalTransfer, 100);
        assert!(engine.create(&admin, input).await.is_err());
    }

    #[tokio::test]
    async fn test_outgoing_may_not_exceed_ledger_debt() {
        let (db, admin, _) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 1_000).await;
        let engine = db.payments();

        let input = ledger_input(&ledger_id, PaymentDirection::Outgoing, 2_000);
        assert!(engine.create(&admin, input).await.is_err());

        // Incoming has no such cap.
        let input = ledger_input(&ledger_id, PaymentDirection::Incoming, 2_000);
        assert!(engine.create(&admin, input).await.is_ok());
    }

    #[tokio::test]
    async fn test_ledger_debt_applied_once_on_first_exit_from_draft() {
        let (db, admin, staff) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 1_000).await;
        let engine = db.payments();

        let payment = engine
            .create(&staff, ledger_input(&ledger_id, PaymentDirection::Outgoing, 400))
            .await
            .unwrap();

        // First tier: debt drops, cash balance untouched.
        engine.approve(&staff, &payment.id).await.unwrap();
        let ledger = db.account_ledgers().get_or_404(&ledger_id).await.unwrap();
        assert_eq!(ledger.debt, 600);
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, 0);

        // Second tier: cash balance moves, debt unchanged.
        engine.approve(&admin, &payment.id).await.unwrap();
        let ledger = db.account_ledgers().get_or_404(&ledger_id).await.unwrap();
        assert_eq!(ledger.debt, 600);
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, -400);

        // Full rejection reverts both.
        engine.reject(&admin, &payment.id).await.unwrap();
        let ledger = db.account_ledgers().get_or_404(&ledger_id).await.unwrap();
        assert_eq!(ledger.debt, 1_000);
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, 0);
    }

    #[tokio::test]
    async fn test_internal_transfer_never_touches_cash_balance() {
        let (db, admin, _) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 500).await;
        let engine = db.payments();

        let payment = engine
            .create(
                &admin,
                ledger_input(&ledger_id, PaymentDirection::InternalTransfer, 200),
            )
            .await
            .unwrap();
        engine.approve(&admin, &payment.id).await.unwrap();

        let ledger = db.account_ledgers().get_or_404(&ledger_id).await.unwrap();
        assert_eq!(ledger.debt, 300);
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, 0);
    }

    #[tokio::test]
    async fn test_investor_payment_materializes_investment_at_full_approval() {
        let (db, admin, _) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let investor_user = db
            .users()
            .create(&admin.user_id, "investor", "argon2-hash", Role::Investor)
            .await
            .unwrap();
        let investor = db
            .investors()
            .create(&admin, &investor_user.id, &contact_id)
            .await
            .unwrap();
        let engine = db.payments();

        let input = PaymentInput {
            amount: 5_000,
            payment_method: PaymentMethod::Cash,
            direction: PaymentDirection::Incoming,
            description: None,
            photo_holder_id: None,
            investor_id: Some(investor.id.clone()),
            transaction_id: None,
            account_ledger_id: None,
            saved_bank_account_id: None,
            contact_id: None,
        };
        let payment = engine.create(&admin, input).await.unwrap();
        engine.approve(&admin, &payment.id).await.unwrap();

        let investor_after = db.investors().get_or_404(&investor.id).await.unwrap();
        assert_eq!(investor_after.credit, 5_000);
        let investments = db.investors().investments(&admin, &investor.id).await.unwrap();
        assert_eq!(investments.len(), 1);
        assert_eq!(investments[0].payment_id, payment.id);
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, 5_000);

        // Rejection unwinds investment, credit, and cash together.
        engine.reject(&admin, &payment.id).await.unwrap();
        let investor_after = db.investors().get_or_404(&investor.id).await.unwrap();
        assert_eq!(investor_after.credit, 0);
        assert!(db
            .investors()
            .investments(&admin, &investor.id)
            .await
            .unwrap()
            .is_empty());
        let (money, _) = db.inventory().current().await.unwrap();
        assert_eq!(money, 0);
    }

    #[tokio::test]
    async fn test_drafts_cannot_be_rejected_and_approved_are_frozen() {
        let (db, admin, staff) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 1_000).await;
        let engine = db.payments();

        let payment = engine
            .create(&staff, ledger_input(&ledger_id, PaymentDirection::Incoming, 100))
            .await
            .unwrap();
        assert!(engine.reject(&staff, &payment.id).await.is_err());

        engine.approve(&admin, &payment.id).await.unwrap();
        // Fully approved: staff cannot reject, nobody can edit.
        assert!(engine.reject(&staff, &payment.id).await.is_err());
        assert!(engine
            .update(
                &admin,
                &payment.id,
                ledger_input(&ledger_id, PaymentDirection::Incoming, 150),
            )
            .await
            .is_err());
        assert!(engine.delete(&admin, &payment.id).await.is_err());
    }

    #[tokio::test]
    async fn test_search_amount_proximity_ordering() {
        let (db, admin, _) = setup().await;
        let contact_id = seed_contact(&db, &admin).await;
        let ledger_id = seed_ledger(&db, &admin, &contact_id, 0).await;
        let engine = db.payments();

        for amount in [100, 900, 480] {
            engine
                .create(&admin, ledger_input(&ledger_id, PaymentDirection::Incoming, amount))
                .await
                .unwrap();
        }

        let filter = PaymentSearch {
            near_amount: Some(500),
            ..Default::default()
        };
        let found = engine.search(&admin, &filter).await.unwrap();
        let amounts: Vec<i64> = found.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![480, 900, 100]);
    }
}
