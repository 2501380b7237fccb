//! # Contact Repository
//!
//! Database operations for contacts (customers, suppliers, investors,
//! colleagues).
//!
//! Ownership scoping: non-admins see and edit only contacts they
//! created, unless granted `contact_read_all` / `contact_update_all`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::map_contact;
use zargar_core::principal::{PERM_CONTACT_READ_ALL, PERM_CONTACT_UPDATE_ALL};
use zargar_core::{authorize, Access, Contact, Principal};

/// Fields a contact update may change.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub contact_type: Option<String>,
    pub phone: Option<Option<String>>,
    pub note: Option<Option<String>>,
}

/// Repository for contact database operations.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ContactRepository { pool }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        name: &str,
        contact_type: &str,
        phone: Option<String>,
        note: Option<String>,
    ) -> DbResult<Contact> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            contact_type: contact_type.to_string(),
            phone,
            note,
            created_by: principal.user_id.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %contact.id, name = %contact.name, "Creating contact");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO contacts (id, name, contact_type, phone, note, created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&contact.id)
        .bind(&contact.name)
        .bind(&contact.contact_type)
        .bind(&contact.phone)
        .bind(&contact.note)
        .bind(&contact.created_by)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "contacts", &contact).await?;
        tx.commit().await?;

        Ok(contact)
    }

    /// Permission-checked fetch: owner, admin, or `contact_read_all`.
    pub async fn get(&self, principal: &Principal, id: &str) -> DbResult<Contact> {
        let contact = self.get_or_404(id).await?;
        authorize(
            principal,
            Access::OwnerOrPermission(PERM_CONTACT_READ_ALL),
            Some(&contact.created_by),
        )
        .map_err(DbError::Domain)?;
        Ok(contact)
    }

    /// Unscoped fetch for engine foreign-key validation.
    pub async fn get_or_404(&self, id: &str) -> DbResult<Contact> {
        let row = sqlx::query("SELECT * FROM contacts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_contact)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Contact", id))
    }

    /// Lists contacts visible to the caller, optionally filtered by a
    /// name substring.
    pub async fn list(&self, principal: &Principal, name_query: Option<&str>) -> DbResult<Vec<Contact>> {
        let see_all = principal.has_permission(PERM_CONTACT_READ_ALL);
        let pattern = name_query.map(|q| format!("%{q}%"));

        let rows = sqlx::query(
            r#"
            SELECT * FROM contacts
            WHERE (?1 OR created_by = ?2)
              AND (?3 IS NULL OR name LIKE ?3)
            ORDER BY name
            "#,
        )
        .bind(see_all)
        .bind(&principal.user_id)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_contact).collect()
    }

    /// Applies a partial update: owner, admin, or `contact_update_all`.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        update: ContactUpdate,
    ) -> DbResult<Contact> {
        let before = self.get_or_404(id).await?;
        authorize(
            principal,
            Access::OwnerOrPermission(PERM_CONTACT_UPDATE_ALL),
            Some(&before.created_by),
        )
        .map_err(DbError::Domain)?;

        let mut after = before.clone();
        if let Some(name) = update.name {
            after.name = name;
        }
        if let Some(contact_type) = update.contact_type {
            after.contact_type = contact_type;
        }
        if let Some(phone) = update.phone {
            after.phone = phone;
        }
        if let Some(note) = update.note {
            after.note = note;
        }
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE contacts
            SET name = ?2, contact_type = ?3, phone = ?4, note = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&after.name)
        .bind(&after.contact_type)
        .bind(&after.phone)
        .bind(&after.note)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_update(&mut tx, &principal.user_id, "contacts", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Deletes a contact: owner or admin only.
    ///
    /// Fails with a foreign-key violation if transactions, ledgers, or
    /// payments still reference it; referenced master data is never
    /// cascaded away.
    pub async fn delete(&self, principal: &Principal, id: &str) -> DbResult<()> {
        let before = self.get_or_404(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.created_by))
            .map_err(DbError::Domain)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM contacts WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record_delete(&mut tx, &principal.user_id, "contacts", &before).await?;
        tx.commit().await?;

        Ok(())
    }
}
