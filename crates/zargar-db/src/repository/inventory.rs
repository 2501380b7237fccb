//! # Inventory Snapshot Store
//!
//! Append-only balance sheet of the shop.
//!
//! ## Append-Only Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Snapshot Chain                            │
//! │                                                                         │
//! │  row N-2          row N-1              row N (latest = current)        │
//! │  ┌──────────┐     ┌──────────┐         ┌──────────┐                    │
//! │  │ gold 10.0│ ──► │ gold 12.5│   ──►   │ gold 10.0│                    │
//! │  │ cash 5000│     │ cash 5000│         │ cash 5000│                    │
//! │  │ txn: T1  │     │ txn: T2  │         │ txn: T2  │ (reversal)         │
//! │  └──────────┘     └──────────┘         └──────────┘                    │
//! │                                                                         │
//! │  Every write copies the latest row and applies deltas. Reversal is    │
//! │  a NEW row with the delta undone. No UPDATE, no DELETE, ever — the    │
//! │  full balance history stays auditable.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engines call [`append_snapshot`] on their own transaction handle
//! so the snapshot commits atomically with the status flip that caused
//! it.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::audit;
use crate::error::{DbError, DbResult};
use crate::row::map_snapshot;
use zargar_core::{authorize, Access, AssetBalances, AssetKind, InventorySnapshot, Principal};

/// One snapshot-producing change: a money delta plus per-asset deltas,
/// tagged with its provenance.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDelta {
    pub money: i64,
    pub assets: Vec<(AssetKind, Decimal)>,
    pub transaction_id: Option<String>,
    pub payment_id: Option<String>,
    pub description: Option<String>,
}

impl SnapshotDelta {
    /// A pure money-balance adjustment from a payment.
    pub fn for_payment(payment_id: &str, money: i64) -> Self {
        SnapshotDelta {
            money,
            payment_id: Some(payment_id.to_string()),
            ..Default::default()
        }
    }

    /// Asset-quantity adjustments from a transaction approval/rejection.
    pub fn for_transaction(transaction_id: &str, assets: Vec<(AssetKind, Decimal)>) -> Self {
        SnapshotDelta {
            assets,
            transaction_id: Some(transaction_id.to_string()),
            ..Default::default()
        }
    }
}

/// Reads the newest snapshot on the given connection, if any.
pub(crate) async fn latest_on(conn: &mut SqliteConnection) -> DbResult<Option<InventorySnapshot>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM inventory_snapshots
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await?;

    row.as_ref().map(map_snapshot).transpose()
}

/// Copies the latest snapshot, applies `delta`, inserts the result as a
/// new row, and returns it. Runs on the caller's transaction handle.
pub(crate) async fn append_snapshot(
    conn: &mut SqliteConnection,
    delta: &SnapshotDelta,
) -> DbResult<InventorySnapshot> {
    let (mut money_balance, mut assets) = match latest_on(conn).await? {
        Some(latest) => (latest.money_balance, latest.assets),
        None => (0, AssetBalances::zero()),
    };

    money_balance += delta.money;
    for (kind, amount) in &delta.assets {
        assets.apply(*kind, *amount).map_err(DbError::Domain)?;
    }

    let snapshot = InventorySnapshot {
        id: Uuid::new_v4().to_string(),
        money_balance,
        assets,
        transaction_id: delta.transaction_id.clone(),
        payment_id: delta.payment_id.clone(),
        description: delta.description.clone(),
        created_at: Utc::now(),
    };

    debug!(
        id = %snapshot.id,
        money_balance = snapshot.money_balance,
        "Appending inventory snapshot"
    );

    sqlx::query(
        r#"
        INSERT INTO inventory_snapshots (
            id, money_balance,
            new_gold, used_gold, persian_coin, molten_gold, saffron,
            dollar, euro, pound,
            emami_coin_86, half_coin_86, quarter_coin_86,
            emami_coin_etc, half_coin_etc, quarter_coin_etc,
            transaction_id, payment_id, description, created_at
        ) VALUES (
            ?1, ?2,
            ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10,
            ?11, ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19, ?20
        )
        "#,
    )
    .bind(&snapshot.id)
    .bind(snapshot.money_balance)
    .bind(snapshot.assets.new_gold.to_string())
    .bind(snapshot.assets.used_gold.to_string())
    .bind(snapshot.assets.persian_coin.to_string())
    .bind(snapshot.assets.molten_gold.to_string())
    .bind(snapshot.assets.saffron.to_string())
    .bind(snapshot.assets.dollar.to_string())
    .bind(snapshot.assets.euro.to_string())
    .bind(snapshot.assets.pound.to_string())
    .bind(snapshot.assets.emami_coin_86)
    .bind(snapshot.assets.half_coin_86)
    .bind(snapshot.assets.quarter_coin_86)
    .bind(snapshot.assets.emami_coin_etc)
    .bind(snapshot.assets.half_coin_etc)
    .bind(snapshot.assets.quarter_coin_etc)
    .bind(&snapshot.transaction_id)
    .bind(&snapshot.payment_id)
    .bind(&snapshot.description)
    .bind(snapshot.created_at)
    .execute(conn)
    .await?;

    Ok(snapshot)
}

/// Repository for reading snapshots and recording manual adjustments.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Returns the newest snapshot, or `None` before the first write.
    pub async fn latest(&self) -> DbResult<Option<InventorySnapshot>> {
        let mut conn = self.pool.acquire().await?;
        latest_on(&mut conn).await
    }

    /// Current balances: the latest snapshot's values, or the
    /// well-defined zero state if nothing has been recorded yet.
    pub async fn current(&self) -> DbResult<(i64, AssetBalances)> {
        Ok(match self.latest().await? {
            Some(snapshot) => (snapshot.money_balance, snapshot.assets),
            None => (0, AssetBalances::zero()),
        })
    }

    /// Paginated history, newest-first.
    pub async fn history(&self, skip: i64, limit: i64) -> DbResult<Vec<InventorySnapshot>> {
        let limit = if limit <= 0 { 50 } else { limit };

        let rows = sqlx::query(
            r#"
            SELECT * FROM inventory_snapshots
            ORDER BY created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(skip.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_snapshot).collect()
    }

    /// Manual admin adjustment. Requires a description explaining the
    /// correction; an adjustment nobody can explain later is useless.
    pub async fn manual_adjust(
        &self,
        principal: &Principal,
        money: i64,
        assets: Vec<(AssetKind, Decimal)>,
        description: &str,
    ) -> DbResult<InventorySnapshot> {
        authorize(principal, Access::AdminOnly, None).map_err(DbError::Domain)?;

        if description.trim().is_empty() {
            return Err(DbError::Domain(zargar_core::CoreError::validation(
                "manual inventory adjustments require a description",
            )));
        }

        let delta = SnapshotDelta {
            money,
            assets,
            description: Some(description.to_string()),
            ..Default::default()
        };

        let mut tx = self.pool.begin().await?;
        let snapshot = append_snapshot(&mut tx, &delta).await?;
        audit::record_create(&mut tx, &principal.user_id, "inventory_snapshots", &snapshot).await?;
        tx.commit().await?;

        Ok(snapshot)
    }
}
