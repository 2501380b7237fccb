//! # Item Repository
//!
//! Database operations for items and their financial profiles.
//!
//! An item is the identity of one tracked asset class (`AssetKind`).
//! The asset name is unique: there is at most one item row per tracked
//! asset. Items referenced by transaction items can never be deleted
//! (FK RESTRICT); retirement is `is_active = false`.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::{decimal_text, map_financial_profile, map_item};
use zargar_core::{
    authorize, Access, AssetKind, Item, ItemFinancialProfile, Principal, TransactionType,
};

/// Default percentages for one item/direction pair.
#[derive(Debug, Clone, Default)]
pub struct ProfileDefaults {
    pub karat: Option<Decimal>,
    pub ojrat: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub tax: Option<Decimal>,
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Creates an item for one tracked asset. Admin-only.
    ///
    /// The measurement kind is derived from the asset, not accepted
    /// from the caller; a countable asset can never be registered as
    /// weight-measured.
    pub async fn create(
        &self,
        principal: &Principal,
        name: AssetKind,
        name_fa: &str,
        category: &str,
        description: Option<String>,
    ) -> DbResult<Item> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            name,
            name_fa: name_fa.to_string(),
            category: category.to_string(),
            description,
            measurement: name.measurement(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name.as_str(), "Creating item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO items (id, name, name_fa, category, description, measurement, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(item.name.as_str())
        .bind(&item.name_fa)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.measurement.as_str())
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "items", &item).await?;
        tx.commit().await?;

        Ok(item)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_item).transpose()
    }

    pub async fn get_or_404(&self, id: &str) -> DbResult<Item> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Lists items, optionally restricted to active ones.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM items
            WHERE (?1 = 0 OR is_active = 1)
            ORDER BY category, name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_item).collect()
    }

    /// Metadata edits only; the asset name and measurement are fixed
    /// for the item's lifetime.
    pub async fn update_metadata(
        &self,
        principal: &Principal,
        id: &str,
        name_fa: Option<String>,
        category: Option<String>,
        description: Option<Option<String>>,
        is_active: Option<bool>,
    ) -> DbResult<Item> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;

        let before = self.get_or_404(id).await?;
        let mut after = before.clone();
        if let Some(name_fa) = name_fa {
            after.name_fa = name_fa;
        }
        if let Some(category) = category {
            after.category = category;
        }
        if let Some(description) = description {
            after.description = description;
        }
        if let Some(is_active) = is_active {
            after.is_active = is_active;
        }
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE items
            SET name_fa = ?2, category = ?3, description = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&after.name_fa)
        .bind(&after.category)
        .bind(&after.description)
        .bind(after.is_active)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_update(&mut tx, &principal.user_id, "items", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    // =========================================================================
    // Financial Profiles
    // =========================================================================

    /// Creates or replaces the default percentages for one direction.
    pub async fn upsert_profile(
        &self,
        principal: &Principal,
        item_id: &str,
        transaction_type: TransactionType,
        defaults: ProfileDefaults,
    ) -> DbResult<ItemFinancialProfile> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;
        self.get_or_404(item_id).await?;

        let existing = self.get_profile(item_id, transaction_type).await?;
        let now = Utc::now();

        let profile = ItemFinancialProfile {
            id: existing
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            item_id: item_id.to_string(),
            transaction_type,
            karat_default: defaults.karat,
            ojrat_default: defaults.ojrat,
            profit_default: defaults.profit,
            tax_default: defaults.tax,
            created_at: existing.as_ref().map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO item_financial_profiles (
                id, item_id, transaction_type,
                karat_default, ojrat_default, profit_default, tax_default,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (item_id, transaction_type) DO UPDATE SET
                karat_default = excluded.karat_default,
                ojrat_default = excluded.ojrat_default,
                profit_default = excluded.profit_default,
                tax_default = excluded.tax_default,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.item_id)
        .bind(profile.transaction_type.as_str())
        .bind(decimal_text(profile.karat_default))
        .bind(decimal_text(profile.ojrat_default))
        .bind(decimal_text(profile.profit_default))
        .bind(decimal_text(profile.tax_default))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await?;

        match existing {
            Some(before) => {
                audit::record_update(
                    &mut tx,
                    &principal.user_id,
                    "item_financial_profiles",
                    &before,
                    &profile,
                )
                .await?
            }
            None => {
                audit::record_create(&mut tx, &principal.user_id, "item_financial_profiles", &profile)
                    .await?
            }
        }

        tx.commit().await?;
        Ok(profile)
    }

    pub async fn get_profile(
        &self,
        item_id: &str,
        transaction_type: TransactionType,
    ) -> DbResult<Option<ItemFinancialProfile>> {
        let row = sqlx::query(
            "SELECT * FROM item_financial_profiles WHERE item_id = ?1 AND transaction_type = ?2",
        )
        .bind(item_id)
        .bind(transaction_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_financial_profile).transpose()
    }

    pub async fn profiles_for_item(&self, item_id: &str) -> DbResult<Vec<ItemFinancialProfile>> {
        let rows = sqlx::query(
            "SELECT * FROM item_financial_profiles WHERE item_id = ?1 ORDER BY transaction_type",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_financial_profile).collect()
    }
}
