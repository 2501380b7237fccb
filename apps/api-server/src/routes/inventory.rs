//! # Inventory Endpoints
//!
//! Read access to the append-only snapshot chain plus the admin-only
//! manual correction, which itself appends a snapshot rather than
//! editing anything in place.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use zargar_core::{AssetBalances, AssetKind, InventorySnapshot};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inventory/current", get(current))
        .route("/api/inventory/history", get(history))
        .route("/api/inventory/adjust", post(adjust))
}

#[derive(Debug, Serialize)]
struct CurrentResponse {
    money_balance: i64,
    assets: AssetBalances,
}

async fn current(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
) -> ApiResult<Json<CurrentResponse>> {
    let (money_balance, assets) = state.db.inventory().current().await?;
    Ok(Json(CurrentResponse {
        money_balance,
        assets,
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default)]
    limit: i64,
}

async fn history(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<InventorySnapshot>>> {
    let snapshots = state.db.inventory().history(query.skip, query.limit).await?;
    Ok(Json(snapshots))
}

#[derive(Debug, Deserialize)]
struct AdjustRequest {
    #[serde(default)]
    money: i64,
    /// Signed per-asset deltas.
    #[serde(default)]
    assets: Vec<(AssetKind, Decimal)>,
    /// Required: why the books are being corrected by hand.
    description: String,
}

async fn adjust(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<InventorySnapshot>> {
    let snapshot = state
        .db
        .inventory()
        .manual_adjust(&principal, req.money, req.assets, &req.description)
        .await?;
    Ok(Json(snapshot))
}
