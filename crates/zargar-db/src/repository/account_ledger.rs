//! # Account Ledger Repository
//!
//! Per-contact running debt records.
//!
//! `debt` is the amount the shop owes the contact. Direct writes set it
//! only at creation; afterwards it moves exclusively through payment
//! approval/rejection edges via [`adjust_debt_on`], which runs on the
//! payment engine's transaction handle.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::repository::contact::ContactRepository;
use crate::row::map_account_ledger;
use zargar_core::{authorize, Access, AccountLedger, Principal};

/// Filter and ordering options for ledger search.
#[derive(Debug, Clone, Default)]
pub struct LedgerSearch {
    /// Only ledgers with nonzero outstanding debt.
    pub with_debt_only: bool,
    /// Bank name substring.
    pub bank_name: Option<String>,
    pub contact_id: Option<String>,
    pub transaction_id: Option<String>,
    /// When set, order by closeness to this debt amount instead of the
    /// default soonest-deadline-first (collections workflow).
    pub near_debt: Option<i64>,
    pub skip: i64,
    pub limit: i64,
}

/// Fields a ledger update may change. Debt is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct LedgerUpdate {
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub description: Option<Option<String>>,
    pub card_number: Option<Option<String>>,
    pub bank_name: Option<Option<String>>,
}

/// Applies a signed delta to a ledger's debt on the caller's
/// transaction handle. Used by the payment engine only.
pub(crate) async fn adjust_debt_on(
    conn: &mut SqliteConnection,
    ledger_id: &str,
    delta: i64,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE account_ledgers SET debt = debt + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(ledger_id)
    .bind(delta)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("AccountLedger", ledger_id));
    }

    debug!(ledger_id = %ledger_id, delta = delta, "Adjusted ledger debt");
    Ok(())
}

/// Repository for account ledger operations.
#[derive(Debug, Clone)]
pub struct AccountLedgerRepository {
    pool: SqlitePool,
}

impl AccountLedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountLedgerRepository { pool }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        contact_id: &str,
        transaction_id: Option<String>,
        debt: i64,
        deadline: Option<DateTime<Utc>>,
        description: Option<String>,
        card_number: Option<String>,
        bank_name: Option<String>,
    ) -> DbResult<AccountLedger> {
        // Resolve the contact first so a bad id reads as NotFound, not
        // as a constraint failure at INSERT time.
        ContactRepository::new(self.pool.clone())
            .get_or_404(contact_id)
            .await?;

        let now = Utc::now();
        let ledger = AccountLedger {
            id: Uuid::new_v4().to_string(),
            contact_id: contact_id.to_string(),
            transaction_id,
            debt,
            deadline,
            description,
            card_number,
            bank_name,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %ledger.id, contact_id = %ledger.contact_id, debt = ledger.debt, "Creating ledger");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO account_ledgers (
                id, contact_id, transaction_id, debt, deadline,
                description, card_number, bank_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ledger.id)
        .bind(&ledger.contact_id)
        .bind(&ledger.transaction_id)
        .bind(ledger.debt)
        .bind(ledger.deadline)
        .bind(&ledger.description)
        .bind(&ledger.card_number)
        .bind(&ledger.bank_name)
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "account_ledgers", &ledger).await?;
        tx.commit().await?;

        Ok(ledger)
    }

    pub async fn get_or_404(&self, id: &str) -> DbResult<AccountLedger> {
        let row = sqlx::query("SELECT * FROM account_ledgers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_account_ledger)
            .transpose()?
            .ok_or_else(|| DbError::not_found("AccountLedger", id))
    }

    /// Updates settlement metadata. The debt amount is not editable
    /// here; only payment transitions move it.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: LedgerUpdate,
    ) -> DbResult<AccountLedger> {
        let before = self.get_or_404(id).await?;

        let mut after = before.clone();
        if let Some(deadline) = update.deadline {
            after.deadline = deadline;
        }
        if let Some(description) = update.description {
            after.description = description;
        }
        if let Some(card_number) = update.card_number {
            after.card_number = card_number;
        }
        if let Some(bank_name) = update.bank_name {
            after.bank_name = bank_name;
        }
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE account_ledgers
            SET deadline = ?2, description = ?3, card_number = ?4, bank_name = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(after.deadline)
        .bind(&after.description)
        .bind(&after.card_number)
        .bind(&after.bank_name)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_update(&mut tx, &principal.user_id, "account_ledgers", &before, &after)
            .await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Deletes a ledger. Admin-only; fails while payments still
    /// reference it (FK RESTRICT).
    pub async fn delete(&self, principal: &Principal, id: &str) -> DbResult<()> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;
        let before = self.get_or_404(id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM account_ledgers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record_delete(&mut tx, &principal.user_id, "account_ledgers", &before).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Searches ledgers.
    ///
    /// Default ordering is soonest-deadline-first with no-deadline rows
    /// last. With `near_debt` set, orders by absolute distance from the
    /// target amount instead.
    pub async fn search(&self, filter: &LedgerSearch) -> DbResult<Vec<AccountLedger>> {
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };
        let bank_pattern = filter.bank_name.as_ref().map(|b| format!("%{b}%"));

        let rows = sqlx::query(
            r#"
            SELECT * FROM account_ledgers
            WHERE (?1 = 0 OR debt != 0)
              AND (?2 IS NULL OR bank_name LIKE ?2)
              AND (?3 IS NULL OR contact_id = ?3)
              AND (?4 IS NULL OR transaction_id = ?4)
            ORDER BY
                CASE WHEN ?5 IS NOT NULL THEN abs(debt - ?5) END ASC,
                CASE WHEN ?5 IS NULL AND deadline IS NULL THEN 1 ELSE 0 END ASC,
                CASE WHEN ?5 IS NULL THEN deadline END ASC,
                created_at DESC
            LIMIT ?6 OFFSET ?7
            "#,
        )
        .bind(filter.with_debt_only)
        .bind(&bank_pattern)
        .bind(&filter.contact_id)
        .bind(&filter.transaction_id)
        .bind(filter.near_debt)
        .bind(limit)
        .bind(filter.skip.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_account_ledger).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use zargar_core::CoreError;

    #[tokio::test]
    async fn test_create_requires_existing_contact() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin_user = db
            .users()
            .bootstrap_admin("admin", "argon2-hash")
            .await
            .unwrap();
        let admin = db.users().load_principal(&admin_user.id).await.unwrap();

        let err = db
            .account_ledgers()
            .create(&admin, "no-such-contact", None, 1_000, None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotFound { .. })
        ));

        let contact = db
            .contacts()
            .create(&admin, "Ali Rezaei", "customer", None, None)
            .await
            .unwrap();
        let ledger = db
            .account_ledgers()
            .create(&admin, &contact.id, None, 1_000, None, None, None, None)
            .await
            .unwrap();
        assert_eq!(ledger.debt, 1_000);
    }
}
