//! # Account Ledger Endpoints
//!
//! Ledger CRUD is metadata-only: the `debt` figure changes exclusively
//! through payment approval edges, never through a PUT here.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use zargar_core::AccountLedger;
use zargar_db::{LedgerSearch, LedgerUpdate};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/account-ledgers", post(create).get(search))
        .route(
            "/api/account-ledgers/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct CreateLedgerRequest {
    contact_id: String,
    transaction_id: Option<String>,
    #[serde(default)]
    debt: i64,
    deadline: Option<DateTime<Utc>>,
    description: Option<String>,
    card_number: Option<String>,
    bank_name: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateLedgerRequest>,
) -> ApiResult<Json<AccountLedger>> {
    let ledger = state
        .db
        .account_ledgers()
        .create(
            &principal,
            &req.contact_id,
            req.transaction_id,
            req.debt,
            req.deadline,
            req.description,
            req.card_number,
            req.bank_name,
        )
        .await?;
    Ok(Json(ledger))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    with_debt_only: bool,
    bank_name: Option<String>,
    contact_id: Option<String>,
    transaction_id: Option<String>,
    near_debt: Option<i64>,
    #[serde(default)]
    skip: i64,
    #[serde(default)]
    limit: i64,
}

async fn search(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<AccountLedger>>> {
    let filter = LedgerSearch {
        with_debt_only: query.with_debt_only,
        bank_name: query.bank_name,
        contact_id: query.contact_id,
        transaction_id: query.transaction_id,
        near_debt: query.near_debt,
        skip: query.skip,
        limit: query.limit,
    };
    let ledgers = state.db.account_ledgers().search(&filter).await?;
    Ok(Json(ledgers))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountLedger>> {
    let ledger = state.db.account_ledgers().get_or_404(&id).await?;
    Ok(Json(ledger))
}

/// No `debt` field here on purpose.
#[derive(Debug, Deserialize)]
struct UpdateLedgerRequest {
    #[serde(default, deserialize_with = "super::patch::double_option")]
    deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    card_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    bank_name: Option<Option<String>>,
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateLedgerRequest>,
) -> ApiResult<Json<AccountLedger>> {
    let update = LedgerUpdate {
        deadline: req.deadline,
        description: req.description,
        card_number: req.card_number,
        bank_name: req.bank_name,
    };
    let ledger = state
        .db
        .account_ledgers()
        .update(&principal, &id, update)
        .await?;
    Ok(Json(ledger))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<()>> {
    state.db.account_ledgers().delete(&principal, &id).await?;
    Ok(Json(()))
}
