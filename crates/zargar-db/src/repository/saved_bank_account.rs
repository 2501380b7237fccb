//! # Saved Bank Account Repository
//!
//! Bank accounts usable as payment settlement targets.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::map_saved_bank_account;
use zargar_core::{Principal, SavedBankAccount};

/// Fields a bank account update may change.
#[derive(Debug, Clone, Default)]
pub struct BankAccountUpdate {
    pub bank_name: Option<String>,
    pub card_number: Option<Option<String>>,
    pub iban: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct SavedBankAccountRepository {
    pool: SqlitePool,
}

impl SavedBankAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SavedBankAccountRepository { pool }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        contact_id: Option<String>,
        bank_name: &str,
        card_number: Option<String>,
        iban: Option<String>,
        description: Option<String>,
    ) -> DbResult<SavedBankAccount> {
        let now = Utc::now();
        let account = SavedBankAccount {
            id: Uuid::new_v4().to_string(),
            contact_id,
            bank_name: bank_name.to_string(),
            card_number,
            iban,
            description,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO saved_bank_accounts (
                id, contact_id, bank_name, card_number, iban, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&account.id)
        .bind(&account.contact_id)
        .bind(&account.bank_name)
        .bind(&account.card_number)
        .bind(&account.iban)
        .bind(&account.description)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "saved_bank_accounts", &account).await?;
        tx.commit().await?;

        Ok(account)
    }

    pub async fn get_or_404(&self, id: &str) -> DbResult<SavedBankAccount> {
        let row = sqlx::query("SELECT * FROM saved_bank_accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_saved_bank_account)
            .transpose()?
            .ok_or_else(|| DbError::not_found("SavedBankAccount", id))
    }

    /// Lists accounts, optionally restricted to one contact.
    pub async fn list(&self, contact_id: Option<&str>) -> DbResult<Vec<SavedBankAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM saved_bank_accounts
            WHERE (?1 IS NULL OR contact_id = ?1)
            ORDER BY bank_name
            "#,
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_saved_bank_account).collect()
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: BankAccountUpdate,
    ) -> DbResult<SavedBankAccount> {
        let before = self.get_or_404(id).await?;

        let mut after = before.clone();
        if let Some(bank_name) = update.bank_name {
            after.bank_name = bank_name;
        }
        if let Some(card_number) = update.card_number {
            after.card_number = card_number;
        }
        if let Some(iban) = update.iban {
            after.iban = iban;
        }
        if let Some(description) = update.description {
            after.description = description;
        }
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE saved_bank_accounts
            SET bank_name = ?2, card_number = ?3, iban = ?4, description = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&after.bank_name)
        .bind(&after.card_number)
        .bind(&after.iban)
        .bind(&after.description)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_update(&mut tx, &principal.user_id, "saved_bank_accounts", &before, &after)
            .await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Fails while payments still reference the account (FK RESTRICT).
    pub async fn delete(&self, principal: &Principal, id: &str) -> DbResult<()> {
        let before = self.get_or_404(id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM saved_bank_accounts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record_delete(&mut tx, &principal.user_id, "saved_bank_accounts", &before).await?;
        tx.commit().await?;

        Ok(())
    }
}
