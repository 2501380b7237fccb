//! # Investor Repository
//!
//! Investor profiles and their derived Investment records.
//!
//! An Investment row is never created or deleted through a direct API
//! call: it materializes when an investor-linked INCOMING payment
//! reaches full approval and disappears if that payment is rejected.
//! Both paths run on the payment engine's transaction handle, together
//! with the matching credit adjustment.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::{map_investment, map_investor};
use zargar_core::{authorize, Access, Investment, Investor, InvestorStatus, Principal};

/// Creates the derived Investment for a fully-approved payment and
/// credits the investor. Runs on the payment engine's transaction.
pub(crate) async fn create_investment_on(
    conn: &mut SqliteConnection,
    investor_id: &str,
    payment_id: &str,
    amount: i64,
) -> DbResult<Investment> {
    let investment = Investment {
        id: Uuid::new_v4().to_string(),
        investor_id: investor_id.to_string(),
        payment_id: payment_id.to_string(),
        amount,
        created_at: Utc::now(),
    };

    debug!(payment_id = %payment_id, amount = amount, "Creating investment");

    sqlx::query(
        r#"
        INSERT INTO investments (id, investor_id, payment_id, amount, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&investment.id)
    .bind(&investment.investor_id)
    .bind(&investment.payment_id)
    .bind(investment.amount)
    .bind(investment.created_at)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query(
        "UPDATE investors SET credit = credit + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(investor_id)
    .bind(amount)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Investor", investor_id));
    }

    Ok(investment)
}

/// Removes the derived Investment when its payment is rejected and
/// debits the investor's credit back.
pub(crate) async fn delete_investment_on(
    conn: &mut SqliteConnection,
    payment_id: &str,
) -> DbResult<Option<Investment>> {
    let row = sqlx::query("SELECT * FROM investments WHERE payment_id = ?1")
        .bind(payment_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(investment) = row.as_ref().map(map_investment).transpose()? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM investments WHERE id = ?1")
        .bind(&investment.id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("UPDATE investors SET credit = credit - ?2, updated_at = ?3 WHERE id = ?1")
        .bind(&investment.investor_id)
        .bind(investment.amount)
        .bind(Utc::now())
        .execute(conn)
        .await?;

    debug!(payment_id = %payment_id, "Deleted investment");
    Ok(Some(investment))
}

/// Repository for investor operations.
#[derive(Debug, Clone)]
pub struct InvestorRepository {
    pool: SqlitePool,
}

impl InvestorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvestorRepository { pool }
    }

    /// Registers an investor over an existing user + contact pair.
    /// Admin-only.
    pub async fn create(
        &self,
        principal: &Principal,
        user_id: &str,
        contact_id: &str,
    ) -> DbResult<Investor> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;

        let now = Utc::now();
        let investor = Investor {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            contact_id: contact_id.to_string(),
            credit: 0,
            status: InvestorStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO investors (id, user_id, contact_id, credit, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&investor.id)
        .bind(&investor.user_id)
        .bind(&investor.contact_id)
        .bind(investor.credit)
        .bind(investor.status.as_str())
        .bind(investor.created_at)
        .bind(investor.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "investors", &investor).await?;
        tx.commit().await?;

        Ok(investor)
    }

    pub async fn get_or_404(&self, id: &str) -> DbResult<Investor> {
        let row = sqlx::query("SELECT * FROM investors WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_investor)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Investor", id))
    }

    /// Looks up the investor profile behind a user account, if any.
    pub async fn get_by_user(&self, user_id: &str) -> DbResult<Option<Investor>> {
        let row = sqlx::query("SELECT * FROM investors WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_investor).transpose()
    }

    pub async fn list(&self) -> DbResult<Vec<Investor>> {
        let rows = sqlx::query("SELECT * FROM investors ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_investor).collect()
    }

    /// Changes an investor's business status. Admin-only; SUSPENDED and
    /// CLOSED gate the investor's login.
    pub async fn set_status(
        &self,
        principal: &Principal,
        id: &str,
        status: InvestorStatus,
    ) -> DbResult<Investor> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;

        let before = self.get_or_404(id).await?;
        let mut after = before.clone();
        after.status = status;
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE investors SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status.as_str())
            .bind(after.updated_at)
            .execute(&mut *tx)
            .await?;

        audit::record_update(&mut tx, &principal.user_id, "investors", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Lists an investor's capital contributions, newest-first.
    ///
    /// Investors may read their own; everyone else needs admin.
    pub async fn investments(&self, principal: &Principal, investor_id: &str) -> DbResult<Vec<Investment>> {
        let investor = self.get_or_404(investor_id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&investor.user_id))
            .map_err(DbError::Domain)?;

        let rows = sqlx::query(
            "SELECT * FROM investments WHERE investor_id = ?1 ORDER BY created_at DESC",
        )
        .bind(investor_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_investment).collect()
    }
}
