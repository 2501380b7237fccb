//! # Transaction Engine
//!
//! Owns the Transaction + TransactionItem aggregate: draft editing,
//! total-price recalculation, the two-tier approval state machine, and
//! the inventory side effects of approval/rejection.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Transaction Lifecycle                               │
//! │                                                                         │
//! │  1. CREATE DRAFT                                                        │
//! │     └── create() → Transaction { status: Draft, total_price: 0 }        │
//! │                                                                         │
//! │  2. EDIT (draft only)                                                   │
//! │     └── add_item() / update_item() / delete_item() / update()           │
//! │     └── total_price recomputed FROM SCRATCH after every item change     │
//! │                                                                         │
//! │  3. APPROVE                                                             │
//! │     └── user:  Draft → ApprovedByUser (no side effects)                 │
//! │     └── admin: → ApprovedByAdmin + ONE InventorySnapshot with the       │
//! │         per-item asset deltas (BUY adds, SELL removes)                  │
//! │                                                                         │
//! │  4. REJECT → Draft                                                      │
//! │     └── from ApprovedByAdmin: a REVERSING snapshot first, so the two    │
//! │         snapshots net to zero                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is a status-guarded UPDATE re-checking the expected
//! prior status; a concurrent approval loses the race at the guard and
//! no side effect runs twice.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::repository::contact::ContactRepository;
use crate::repository::inventory::{append_snapshot, SnapshotDelta};
use crate::repository::item::ItemRepository;
use crate::row::{decimal_text, map_transaction, map_transaction_item, parse_enum};
use zargar_core::{
    approval, authorize, pricing, validation, Access, ApprovalStatus, AssetKind, CoreError,
    Principal, Transaction, TransactionItem, TransactionType,
};

/// Input for one line item, before pricing.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub item_id: String,
    pub transaction_type: TransactionType,
    pub title: String,
    pub weight_count: Decimal,
    pub unit_price: i64,
    /// Absent percentages fall back to the item's financial profile for
    /// the line's direction, then to zero.
    pub karat: Option<Decimal>,
    pub ojrat: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub tax: Option<Decimal>,
}

/// Fields a draft transaction update may change.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub contact_id: Option<String>,
    pub note: Option<Option<String>>,
    pub discount: Option<i64>,
}

/// Search filters. Item-level filters join through transaction_items.
#[derive(Debug, Clone, Default)]
pub struct TransactionSearch {
    pub recorder_id: Option<String>,
    pub contact_id: Option<String>,
    pub status: Option<ApprovalStatus>,
    pub created_after: Option<chrono::DateTime<Utc>>,
    pub created_before: Option<chrono::DateTime<Utc>>,
    /// Substring match on any contained item title.
    pub item_title: Option<String>,
    pub item_id: Option<String>,
    pub item_transaction_type: Option<TransactionType>,
    pub skip: i64,
    pub limit: i64,
}

/// Engine for the transaction aggregate.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    pool: SqlitePool,
}

impl TransactionEngine {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionEngine { pool }
    }

    // =========================================================================
    // Draft CRUD
    // =========================================================================

    /// Creates a new draft transaction with no items.
    pub async fn create(
        &self,
        principal: &Principal,
        contact_id: &str,
        note: Option<String>,
        discount: i64,
    ) -> DbResult<Transaction> {
        if discount < 0 {
            return Err(DbError::Domain(CoreError::validation(
                "discount must be non-negative",
            )));
        }
        ContactRepository::new(self.pool.clone())
            .get_or_404(contact_id)
            .await?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            recorder_id: principal.user_id.clone(),
            contact_id: contact_id.to_string(),
            note,
            status: ApprovalStatus::Draft,
            discount,
            total_price: -discount,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %transaction.id, contact_id = %contact_id, "Creating transaction");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, recorder_id, contact_id, note, status, discount, total_price,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.recorder_id)
        .bind(&transaction.contact_id)
        .bind(&transaction.note)
        .bind(transaction.status.as_str())
        .bind(transaction.discount)
        .bind(transaction.total_price)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await?;

        audit::record_create(&mut tx, &principal.user_id, "transactions", &transaction).await?;
        tx.commit().await?;

        Ok(transaction)
    }

    /// Updates note/discount/contact on a draft.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        patch: TransactionPatch,
    ) -> DbResult<Transaction> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&before)?;

        if let Some(discount) = patch.discount {
            if discount < 0 {
                return Err(DbError::Domain(CoreError::validation(
                    "discount must be non-negative",
                )));
            }
        }
        if let Some(contact_id) = &patch.contact_id {
            ContactRepository::new(self.pool.clone())
                .get_or_404(contact_id)
                .await?;
        }

        let mut after = before.clone();
        if let Some(contact_id) = patch.contact_id {
            after.contact_id = contact_id;
        }
        if let Some(note) = patch.note {
            after.note = note;
        }
        if let Some(discount) = patch.discount {
            after.discount = discount;
        }
        after.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Status re-checked under the write lock: the draft check above
        // raced against nothing yet.
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET contact_id = ?2, note = ?3, discount = ?4, updated_at = ?5
            WHERE id = ?1 AND status = 'draft'
            "#,
        )
        .bind(id)
        .bind(&after.contact_id)
        .bind(&after.note)
        .bind(after.discount)
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(
                "only draft transactions can be updated",
            ));
        }

        after.total_price = recompute_total(&mut tx, id, after.discount).await?;
        audit::record_update(&mut tx, &principal.user_id, "transactions", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Deletes a draft transaction and (via FK cascade) its items.
    pub async fn delete(&self, principal: &Principal, id: &str) -> DbResult<()> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&before)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1 AND status = 'draft'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::invalid_state(
                "only draft transactions can be deleted",
            ));
        }

        audit::record_delete(&mut tx, &principal.user_id, "transactions", &before).await?;
        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Item Mutations
    // =========================================================================

    /// Adds a line item to a draft and recomputes the parent total.
    pub async fn add_item(
        &self,
        principal: &Principal,
        transaction_id: &str,
        input: ItemInput,
    ) -> DbResult<TransactionItem> {
        let parent = self.get_unchecked(transaction_id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&parent.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&parent)?;

        let line = self.price_line(transaction_id, input).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transaction_items (
                id, transaction_id, item_id, transaction_type, title,
                weight_count, unit_price, total_price,
                karat, ojrat, profit, tax, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&line.id)
        .bind(&line.transaction_id)
        .bind(&line.item_id)
        .bind(line.transaction_type.as_str())
        .bind(&line.title)
        .bind(line.weight_count.to_string())
        .bind(line.unit_price)
        .bind(line.total_price)
        .bind(decimal_text(line.karat))
        .bind(decimal_text(line.ojrat))
        .bind(decimal_text(line.profit))
        .bind(decimal_text(line.tax))
        .bind(line.created_at)
        .bind(line.updated_at)
        .execute(&mut *tx)
        .await?;

        self.finish_item_mutation(&mut tx, &parent).await?;
        audit::record_create(&mut tx, &principal.user_id, "transaction_items", &line).await?;
        tx.commit().await?;

        Ok(line)
    }

    /// Replaces a line item's fields and reprices it.
    pub async fn update_item(
        &self,
        principal: &Principal,
        transaction_id: &str,
        item_id: &str,
        input: ItemInput,
    ) -> DbResult<TransactionItem> {
        let parent = self.get_unchecked(transaction_id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&parent.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&parent)?;

        let before = self.get_item(transaction_id, item_id).await?;
        let mut line = self.price_line(transaction_id, input).await?;
        line.id = before.id.clone();
        line.created_at = before.created_at;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE transaction_items
            SET item_id = ?3, transaction_type = ?4, title = ?5, weight_count = ?6,
                unit_price = ?7, total_price = ?8, karat = ?9, ojrat = ?10,
                profit = ?11, tax = ?12, updated_at = ?13
            WHERE id = ?1 AND transaction_id = ?2
            "#,
        )
        .bind(&line.id)
        .bind(transaction_id)
        .bind(&line.item_id)
        .bind(line.transaction_type.as_str())
        .bind(&line.title)
        .bind(line.weight_count.to_string())
        .bind(line.unit_price)
        .bind(line.total_price)
        .bind(decimal_text(line.karat))
        .bind(decimal_text(line.ojrat))
        .bind(decimal_text(line.profit))
        .bind(decimal_text(line.tax))
        .bind(line.updated_at)
        .execute(&mut *tx)
        .await?;

        self.finish_item_mutation(&mut tx, &parent).await?;
        audit::record_update(&mut tx, &principal.user_id, "transaction_items", &before, &line)
            .await?;
        tx.commit().await?;

        Ok(line)
    }

    /// Removes a line item and recomputes the parent total.
    pub async fn delete_item(
        &self,
        principal: &Principal,
        transaction_id: &str,
        item_id: &str,
    ) -> DbResult<()> {
        let parent = self.get_unchecked(transaction_id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&parent.recorder_id))
            .map_err(DbError::Domain)?;
        require_draft(&parent)?;

        let before = self.get_item(transaction_id, item_id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM transaction_items WHERE id = ?1 AND transaction_id = ?2")
            .bind(item_id)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        self.finish_item_mutation(&mut tx, &parent).await?;
        audit::record_delete(&mut tx, &principal.user_id, "transaction_items", &before).await?;
        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // State Machine
    // =========================================================================

    /// Approves one tier. Reaching ApprovedByAdmin writes the inventory
    /// snapshot with this transaction's per-item asset deltas.
    pub async fn approve(&self, principal: &Principal, id: &str) -> DbResult<Transaction> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;

        let next = approval::next_approval_status(before.status, principal.is_admin())
            .map_err(DbError::Domain)?;

        let mut tx = self.pool.begin().await?;
        guarded_status_flip(&mut tx, id, before.status, next).await?;

        if next == ApprovalStatus::ApprovedByAdmin {
            let deltas = asset_deltas(&mut tx, id, false).await?;
            append_snapshot(&mut tx, &SnapshotDelta::for_transaction(id, deltas)).await?;
            info!(id = %id, "Transaction fully approved; inventory updated");
        }

        let mut after = before.clone();
        after.status = next;
        after.updated_at = Utc::now();

        audit::record_update(&mut tx, &principal.user_id, "transactions", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    /// Rejects back to draft. Leaving ApprovedByAdmin writes the
    /// reversing snapshot first, so approval + rejection net to zero.
    pub async fn reject(&self, principal: &Principal, id: &str) -> DbResult<Transaction> {
        let before = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&before.recorder_id))
            .map_err(DbError::Domain)?;

        approval::check_rejection(before.status, principal.is_admin()).map_err(DbError::Domain)?;

        let mut tx = self.pool.begin().await?;
        guarded_status_flip(&mut tx, id, before.status, ApprovalStatus::Draft).await?;

        if before.status == ApprovalStatus::ApprovedByAdmin {
            let deltas = asset_deltas(&mut tx, id, true).await?;
            append_snapshot(&mut tx, &SnapshotDelta::for_transaction(id, deltas)).await?;
            info!(id = %id, "Transaction rejected from full approval; inventory reversed");
        }

        let mut after = before.clone();
        after.status = ApprovalStatus::Draft;
        after.updated_at = Utc::now();

        audit::record_update(&mut tx, &principal.user_id, "transactions", &before, &after).await?;
        tx.commit().await?;

        Ok(after)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Permission-checked fetch: non-admins see only their own records.
    pub async fn get(&self, principal: &Principal, id: &str) -> DbResult<Transaction> {
        let transaction = self.get_unchecked(id).await?;
        authorize(principal, Access::OwnerOrAdmin, Some(&transaction.recorder_id))
            .map_err(DbError::Domain)?;
        Ok(transaction)
    }

    /// Lists a transaction's line items in insertion order.
    pub async fn items(&self, principal: &Principal, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        // Reuse the ownership check.
        self.get(principal, transaction_id).await?;

        let rows = sqlx::query(
            "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY created_at, id",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction_item).collect()
    }

    /// Role-scoped search: non-admins are pinned to their own records
    /// regardless of the recorder filter they pass.
    pub async fn search(
        &self,
        principal: &Principal,
        filter: &TransactionSearch,
    ) -> DbResult<Vec<Transaction>> {
        let recorder_id = if principal.is_admin() {
            filter.recorder_id.clone()
        } else {
            Some(principal.user_id.clone())
        };
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };
        let title_pattern = filter.item_title.as_ref().map(|t| format!("%{t}%"));

        let rows = sqlx::query(
            r#"
            SELECT t.* FROM transactions t
            WHERE (?1 IS NULL OR t.recorder_id = ?1)
              AND (?2 IS NULL OR t.contact_id = ?2)
              AND (?3 IS NULL OR t.status = ?3)
              AND (?4 IS NULL OR t.created_at >= ?4)
              AND (?5 IS NULL OR t.created_at <= ?5)
              AND (?6 IS NULL AND ?7 IS NULL AND ?8 IS NULL OR EXISTS (
                    SELECT 1 FROM transaction_items ti
                    WHERE ti.transaction_id = t.id
                      AND (?6 IS NULL OR ti.title LIKE ?6)
                      AND (?7 IS NULL OR ti.item_id = ?7)
                      AND (?8 IS NULL OR ti.transaction_type = ?8)
              ))
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT ?9 OFFSET ?10
            "#,
        )
        .bind(&recorder_id)
        .bind(&filter.contact_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.created_after)
        .bind(filter.created_before)
        .bind(&title_pattern)
        .bind(&filter.item_id)
        .bind(filter.item_transaction_type.map(|t| t.as_str()))
        .bind(limit)
        .bind(filter.skip.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction).collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn get_unchecked(&self, id: &str) -> DbResult<Transaction> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(map_transaction)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    async fn get_item(&self, transaction_id: &str, item_id: &str) -> DbResult<TransactionItem> {
        let row = sqlx::query(
            "SELECT * FROM transaction_items WHERE id = ?1 AND transaction_id = ?2",
        )
        .bind(item_id)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(map_transaction_item)
            .transpose()?
            .ok_or_else(|| DbError::not_found("TransactionItem", item_id))
    }

    /// Validates an item input and computes its priced line.
    async fn price_line(&self, transaction_id: &str, input: ItemInput) -> DbResult<TransactionItem> {
        let items = ItemRepository::new(self.pool.clone());
        let item = items.get_or_404(&input.item_id).await?;
        if !item.is_active {
            return Err(DbError::Domain(CoreError::validation(format!(
                "item '{}' is inactive",
                item.name.as_str()
            ))));
        }

        validation::check_weight_count(item.measurement, input.weight_count)
            .map_err(DbError::Domain)?;
        if input.unit_price < 0 {
            return Err(DbError::Domain(CoreError::validation(
                "unit price must be non-negative",
            )));
        }
        for (name, value) in [
            ("ojrat", input.ojrat),
            ("profit", input.profit),
            ("tax", input.tax),
        ] {
            validation::check_percentage(name, value).map_err(DbError::Domain)?;
        }

        // Absent percentages fall back to the item's profile for this
        // direction; the resolved values are captured on the line so
        // later profile edits cannot change history.
        let profile = items
            .get_profile(&input.item_id, input.transaction_type)
            .await?;
        let karat = input.karat.or(profile.as_ref().and_then(|p| p.karat_default));
        let ojrat = input.ojrat.or(profile.as_ref().and_then(|p| p.ojrat_default));
        let profit = input
            .profit
            .or(profile.as_ref().and_then(|p| p.profit_default));
        let tax = input.tax.or(profile.as_ref().and_then(|p| p.tax_default));

        let total_price =
            pricing::item_total_price(input.unit_price, input.weight_count, ojrat, profit, tax);

        let now = Utc::now();
        Ok(TransactionItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            item_id: input.item_id,
            transaction_type: input.transaction_type,
            title: input.title,
            weight_count: input.weight_count,
            unit_price: input.unit_price,
            total_price,
            karat,
            ojrat,
            profit,
            tax,
            created_at: now,
            updated_at: now,
        })
    }

    /// Recomputes the parent's total from the full current item set on
    /// the mutation's own transaction handle.
    async fn finish_item_mutation(
        &self,
        tx: &mut SqliteConnection,
        parent: &Transaction,
    ) -> DbResult<()> {
        let total = recompute_total(tx, &parent.id, parent.discount).await?;
        debug!(transaction_id = %parent.id, total_price = total, "Recomputed transaction total");
        Ok(())
    }
}

/// Status-guarded UPDATE: flips `old → new` only if the row still holds
/// `old`. Zero rows affected means a concurrent writer got there first.
async fn guarded_status_flip(
    conn: &mut SqliteConnection,
    id: &str,
    old: ApprovalStatus,
    new: ApprovalStatus,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE transactions SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
    )
    .bind(id)
    .bind(old.as_str())
    .bind(new.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::invalid_state(format!(
            "transaction {id} was modified concurrently; expected status '{}'",
            old.as_str()
        )));
    }
    Ok(())
}

/// Recomputes and persists the parent's total price from scratch,
/// returning the new value. Must run on the mutation's own transaction.
///
/// The UPDATE is status-guarded: if a concurrent approval flipped the
/// parent out of draft between the caller's pre-check and this write,
/// zero rows match and the whole item mutation rolls back instead of
/// re-totaling a frozen record behind its inventory snapshot.
async fn recompute_total(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    discount: i64,
) -> DbResult<i64> {
    let rows = sqlx::query(
        "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY created_at, id",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    let items: Vec<TransactionItem> = rows
        .iter()
        .map(map_transaction_item)
        .collect::<DbResult<_>>()?;
    let total = pricing::transaction_total(&items, discount);

    let result = sqlx::query(
        "UPDATE transactions SET total_price = ?2, updated_at = ?3 WHERE id = ?1 AND status = 'draft'",
    )
    .bind(transaction_id)
    .bind(total)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::invalid_state(format!(
            "transaction {transaction_id} left draft concurrently; item change rolled back"
        )));
    }

    Ok(total)
}

/// Loads the per-item inventory deltas for a transaction: BUY adds to
/// the shop's holding, SELL removes. `reverse` negates for rejection.
async fn asset_deltas(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    reverse: bool,
) -> DbResult<Vec<(AssetKind, Decimal)>> {
    let rows = sqlx::query(
        r#"
        SELECT i.name AS asset_name, ti.transaction_type, ti.weight_count
        FROM transaction_items ti
        JOIN items i ON i.id = ti.item_id
        WHERE ti.transaction_id = ?1
        "#,
    )
    .bind(transaction_id)
    .fetch_all(conn)
    .await?;

    let mut deltas = Vec::with_capacity(rows.len());
    for row in &rows {
        let kind: AssetKind = parse_enum(row, "asset_name")?;
        let transaction_type: TransactionType = parse_enum(row, "transaction_type")?;
        let weight_count = crate::row::decimal(row, "weight_count")?;

        let mut delta = pricing::signed_quantity(transaction_type, weight_count);
        if reverse {
            delta = -delta;
        }
        deltas.push((kind, delta));
    }
    Ok(deltas)
}

fn require_draft(transaction: &Transaction) -> DbResult<()> {
    if transaction.status != ApprovalStatus::Draft {
        return Err(DbError::invalid_state(format!(
            "transaction {} is '{}'; only drafts can be edited",
            transaction.id,
            transaction.status.as_str()
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
    use rust_decimal::Decimal;
    use std::str::FromStr as _;
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

    /// Contact + registered gold item, the minimum a transaction needs.
    async fn seed_catalog(db: &Database, admin: &Principal) -> (String, String) {
        let contact = db
            .contacts()
            .create(admin, "Ali Rezaei", "customer", None, None)
            .await
            .unwrap();
        let item = db
            .items()
            .create(admin, AssetKind::NewGold, "طلای نو", "gold", None)
            .await
            .unwrap();
        (contact.id, item.id)
    }

    fn gold_line(item_id: &str, transaction_type: TransactionType) -> ItemInput {
        ItemInput {
            item_id: item_id.to_string(),
            transaction_type,
            title: "18k bracelet".to_string(),
            weight_count: Decimal::from(2),
            unit_price: 1000,
            karat: Some(Decimal::from(18)),
            ojrat: Some(Decimal::from_str("10.0").unwrap()),
            profit: Some(Decimal::from_str("5.0").unwrap()),
            tax: Some(Decimal::from_str("9.0").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_item_mutations_recompute_total() {
        let (db, admin, _) = setup().await;
        let (contact_id, item_id) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        let txn = engine.create(&admin, &contact_id, None, 100).await.unwrap();
        assert_eq!(txn.total_price, -100);

        let line = engine
            .add_item(&admin, &txn.id, gold_line(&item_id, TransactionType::Buy))
            .await
            .unwrap();
        assert_eq!(line.total_price, 2337);

        let txn = engine.get(&admin, &txn.id).await.unwrap();
        assert_eq!(txn.total_price, 2337 - 100);

        engine.delete_item(&admin, &txn.id, &line.id).await.unwrap();
        let txn = engine.get(&admin, &txn.id).await.unwrap();
        assert_eq!(txn.total_price, -100);
    }

    #[tokio::test]
    async fn test_admin_approval_updates_inventory_and_reject_reverses() {
        let (db, admin, _) = setup().await;
        let (contact_id, item_id) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        let txn = engine.create(&admin, &contact_id, None, 0).await.unwrap();
        engine
            .add_item(&admin, &txn.id, gold_line(&item_id, TransactionType::Buy))
            .await
            .unwrap();

        // Admins go Draft → ApprovedByAdmin directly.
        let approved = engine.approve(&admin, &txn.id).await.unwrap();
        assert_eq!(approved.status, ApprovalStatus::ApprovedByAdmin);

        let (_, assets) = db.inventory().current().await.unwrap();
        assert_eq!(assets.get(AssetKind::NewGold), Decimal::from(2));

        let rejected = engine.reject(&admin, &txn.id).await.unwrap();
        assert_eq!(rejected.status, ApprovalStatus::Draft);

        let (_, assets) = db.inventory().current().await.unwrap();
        assert_eq!(assets.get(AssetKind::NewGold), Decimal::ZERO);
        // Both movements stay on the books.
        assert_eq!(db.inventory().history(0, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_two_tier_approval_for_staff() {
        let (db, admin, staff) = setup().await;
        let (contact_id, item_id) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        let txn = engine.create(&staff, &contact_id, None, 0).await.unwrap();
        engine
            .add_item(&staff, &txn.id, gold_line(&item_id, TransactionType::Sell))
            .await
            .unwrap();

        let tier_one = engine.approve(&staff, &txn.id).await.unwrap();
        assert_eq!(tier_one.status, ApprovalStatus::ApprovedByUser);

        // First tier has no inventory effect.
        let (_, assets) = db.inventory().current().await.unwrap();
        assert_eq!(assets.get(AssetKind::NewGold), Decimal::ZERO);

        // Staff cannot grant the second tier.
        assert!(engine.approve(&staff, &txn.id).await.is_err());

        let tier_two = engine.approve(&admin, &txn.id).await.unwrap();
        assert_eq!(tier_two.status, ApprovalStatus::ApprovedByAdmin);

        let (_, assets) = db.inventory().current().await.unwrap();
        assert_eq!(assets.get(AssetKind::NewGold), Decimal::from(-2));
    }

    #[tokio::test]
    async fn test_approved_transactions_are_frozen() {
        let (db, admin, _) = setup().await;
        let (contact_id, item_id) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        let txn = engine.create(&admin, &contact_id, None, 0).await.unwrap();
        engine
            .add_item(&admin, &txn.id, gold_line(&item_id, TransactionType::Buy))
            .await
            .unwrap();
        engine.approve(&admin, &txn.id).await.unwrap();

        assert!(engine
            .update(&admin, &txn.id, TransactionPatch::default())
            .await
            .is_err());
        assert!(engine
            .add_item(&admin, &txn.id, gold_line(&item_id, TransactionType::Buy))
            .await
            .is_err());
        assert!(engine.delete(&admin, &txn.id).await.is_err());
        // Double-approval of a finished record fails too.
        assert!(engine.approve(&admin, &txn.id).await.is_err());
    }

    #[tokio::test]
    async fn test_search_pins_non_admins_to_own_records() {
        let (db, admin, staff) = setup().await;
        let (contact_id, _) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        engine.create(&admin, &contact_id, None, 0).await.unwrap();
        let own = engine.create(&staff, &contact_id, None, 0).await.unwrap();

        let all = engine
            .search(&admin, &TransactionSearch::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let scoped = engine
            .search(&staff, &TransactionSearch::default())
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, own.id);
    }

    #[tokio::test]
    async fn test_countable_items_reject_fractional_quantities() {
        let (db, admin, _) = setup().await;
        let (contact_id, _) = seed_catalog(&db, &admin).await;
        let coin = db
            .items()
            .create(&admin, AssetKind::EmamiCoin86, "سکه امامی ۸۶", "coin", None)
            .await
            .unwrap();
        let engine = db.transactions();

        let txn = engine.create(&admin, &contact_id, None, 0).await.unwrap();
        let mut line = gold_line(&coin.id, TransactionType::Buy);
        line.weight_count = Decimal::from_str("1.5").unwrap();

        assert!(engine.add_item(&admin, &txn.id, line).await.is_err());
    }

    /// An item write racing an approval commits its re-total through a
    /// draft-guarded UPDATE; once the parent is approved the guard
    /// matches zero rows and the mutation aborts instead of changing a
    /// record whose inventory snapshot is already on the books.
    #[tokio::test]
    async fn test_total_recompute_aborts_once_parent_leaves_draft() {
        let (db, admin, _) = setup().await;
        let (contact_id, item_id) = seed_catalog(&db, &admin).await;
        let engine = db.transactions();

        let txn = engine.create(&admin, &contact_id, None, 0).await.unwrap();
        engine
            .add_item(&admin, &txn.id, gold_line(&item_id, TransactionType::Buy))
            .await
            .unwrap();
        engine.approve(&admin, &txn.id).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let err = recompute_total(&mut tx, &txn.id, 0).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState(_))
        ));
        tx.rollback().await.unwrap();

        // The frozen total is untouched.
        let after = engine.get(&admin, &txn.id).await.unwrap();
        assert_eq!(after.total_price, 2337);
    }
}
