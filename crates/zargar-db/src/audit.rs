//! # Audit Trail
//!
//! Before/after records for every tracked mutation.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Audit Write Path                                 │
//! │                                                                         │
//! │  Engine mutation (one sqlx transaction)                                │
//! │    ├── UPDATE payments SET status = ...                                │
//! │    ├── INSERT INTO inventory_snapshots ...                             │
//! │    └── record_update(&mut tx, actor, "payments", before, after)        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  COMMIT — audit row and mutation land together, or neither does        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The audit write shares the caller's transaction handle. A failed
//! audit write fails the whole unit of work; a failed mutation rolls
//! the audit row back with it. There is no ambient "current user": the
//! acting principal's id is an explicit argument.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::DbResult;
use crate::row::map_audit_entry;
use zargar_core::{AuditLogEntry, AuditOperation};

/// Records a CREATE with the new row's state.
pub async fn record_create<T: Serialize>(
    conn: &mut SqliteConnection,
    actor_id: &str,
    table_name: &str,
    after: &T,
) -> DbResult<()> {
    let after = serde_json::to_string(after)?;
    insert(conn, actor_id, AuditOperation::Create, table_name, None, Some(after)).await
}

/// Records an UPDATE with both states.
pub async fn record_update<T: Serialize>(
    conn: &mut SqliteConnection,
    actor_id: &str,
    table_name: &str,
    before: &T,
    after: &T,
) -> DbResult<()> {
    let before = serde_json::to_string(before)?;
    let after = serde_json::to_string(after)?;
    insert(
        conn,
        actor_id,
        AuditOperation::Update,
        table_name,
        Some(before),
        Some(after),
    )
    .await
}

/// Records a DELETE with the removed row's state.
pub async fn record_delete<T: Serialize>(
    conn: &mut SqliteConnection,
    actor_id: &str,
    table_name: &str,
    before: &T,
) -> DbResult<()> {
    let before = serde_json::to_string(before)?;
    insert(conn, actor_id, AuditOperation::Delete, table_name, Some(before), None).await
}

async fn insert(
    conn: &mut SqliteConnection,
    actor_id: &str,
    operation: AuditOperation,
    table_name: &str,
    before_state: Option<String>,
    after_state: Option<String>,
) -> DbResult<()> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO audit_logs (
            id, user_id, operation, table_name,
            before_state, after_state, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(id)
    .bind(actor_id)
    .bind(operation.as_str())
    .bind(table_name)
    .bind(before_state)
    .bind(after_state)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Listing
// =============================================================================

/// Filter set for audit-log queries. All fields optional and ANDed.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub table_name: Option<String>,
    pub user_id: Option<String>,
    pub operation: Option<AuditOperation>,
    pub skip: i64,
    pub limit: i64,
}

/// Read-side access to the audit trail (admin surface).
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: sqlx::SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Lists audit entries newest-first.
    pub async fn list(&self, filter: &AuditLogFilter) -> DbResult<Vec<AuditLogEntry>> {
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, operation, table_name,
                   before_state, after_state, created_at
            FROM audit_logs
            WHERE (?1 IS NULL OR table_name = ?1)
              AND (?2 IS NULL OR user_id = ?2)
              AND (?3 IS NULL OR operation = ?3)
            ORDER BY created_at DESC, id DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(&filter.table_name)
        .bind(&filter.user_id)
        .bind(filter.operation.map(|op| op.as_str()))
        .bind(limit)
        .bind(filter.skip.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_audit_entry).collect()
    }
}
