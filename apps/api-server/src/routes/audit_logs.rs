//! # Audit Trail Endpoints
//!
//! Read-only and admin-only. Writes happen inside every mutation's
//! database transaction; there is no endpoint that can add, edit, or
//! remove an audit row.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use zargar_core::{authorize, Access, AuditLogEntry, AuditOperation};
use zargar_db::AuditLogFilter;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/audit-logs", get(list))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    table_name: Option<String>,
    user_id: Option<String>,
    operation: Option<AuditOperation>,
    #[serde(default)]
    skip: i64,
    #[serde(default)]
    limit: i64,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<AuditLogEntry>>> {
    authorize(&principal, Access::AdminOnly, None)?;

    let filter = AuditLogFilter {
        table_name: query.table_name,
        user_id: query.user_id,
        operation: query.operation,
        skip: query.skip,
        limit: query.limit,
    };
    let entries = state.db.audit_logs().list(&filter).await?;
    Ok(Json(entries))
}
