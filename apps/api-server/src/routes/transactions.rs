//! # Transaction Endpoints
//!
//! Draft CRUD, line-item editing, and the two approval transitions.
//! All pricing and state-machine logic lives in the engine; these
//! handlers only shuttle JSON.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use zargar_core::{ApprovalStatus, Transaction, TransactionItem, TransactionType};
use zargar_db::{ItemInput, TransactionPatch, TransactionSearch};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", post(create).get(search))
        .route(
            "/api/transactions/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/api/transactions/{id}/items", post(add_item).get(items))
        .route(
            "/api/transactions/{id}/items/{item_id}",
            axum::routing::put(update_item).delete(delete_item),
        )
        .route("/api/transactions/{id}/approve", post(approve))
        .route("/api/transactions/{id}/reject", post(reject))
}

#[derive(Debug, Deserialize)]
struct CreateTransactionRequest {
    contact_id: String,
    note: Option<String>,
    #[serde(default)]
    discount: i64,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateTransactionRequest>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state
        .db
        .transactions()
        .create(&principal, &req.contact_id, req.note, req.discount)
        .await?;
    Ok(Json(transaction))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    recorder_id: Option<String>,
    contact_id: Option<String>,
    status: Option<ApprovalStatus>,
    created_after: Option<DateTime<Utc>>,
    created_before: Option<DateTime<Utc>>,
    item_title: Option<String>,
    item_id: Option<String>,
    item_transaction_type: Option<TransactionType>,
    #[serde(default)]
    skip: i64,
    #[serde(default)]
    limit: i64,
}

async fn search(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let filter = TransactionSearch {
        recorder_id: query.recorder_id,
        contact_id: query.contact_id,
        status: query.status,
        created_after: query.created_after,
        created_before: query.created_before,
        item_title: query.item_title,
        item_id: query.item_id,
        item_transaction_type: query.item_transaction_type,
        skip: query.skip,
        limit: query.limit,
    };
    let transactions = state.db.transactions().search(&principal, &filter).await?;
    Ok(Json(transactions))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state.db.transactions().get(&principal, &id).await?;
    Ok(Json(transaction))
}

#[derive(Debug, Deserialize)]
struct UpdateTransactionRequest {
    contact_id: Option<String>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    note: Option<Option<String>>,
    discount: Option<i64>,
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<Transaction>> {
    let patch = TransactionPatch {
        contact_id: req.contact_id,
        note: req.note,
        discount: req.discount,
    };
    let transaction = state.db.transactions().update(&principal, &id, patch).await?;
    Ok(Json(transaction))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<()>> {
    state.db.transactions().delete(&principal, &id).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct ItemRequest {
    item_id: String,
    transaction_type: TransactionType,
    title: String,
    weight_count: Decimal,
    unit_price: i64,
    karat: Option<Decimal>,
    ojrat: Option<Decimal>,
    profit: Option<Decimal>,
    tax: Option<Decimal>,
}

impl From<ItemRequest> for ItemInput {
    fn from(req: ItemRequest) -> Self {
        ItemInput {
            item_id: req.item_id,
            transaction_type: req.transaction_type,
            title: req.title,
            weight_count: req.weight_count,
            unit_price: req.unit_price,
            karat: req.karat,
            ojrat: req.ojrat,
            profit: req.profit,
            tax: req.tax,
        }
    }
}

async fn add_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<Json<TransactionItem>> {
    let line = state
        .db
        .transactions()
        .add_item(&principal, &id, req.into())
        .await?;
    Ok(Json(line))
}

async fn items(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TransactionItem>>> {
    let lines = state.db.transactions().items(&principal, &id).await?;
    Ok(Json(lines))
}

async fn update_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<ItemRequest>,
) -> ApiResult<Json<TransactionItem>> {
    let line = state
        .db
        .transactions()
        .update_item(&principal, &id, &item_id, req.into())
        .await?;
    Ok(Json(line))
}

async fn delete_item(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<()>> {
    state
        .db
        .transactions()
        .delete_item(&principal, &id, &item_id)
        .await?;
    Ok(Json(()))
}

async fn approve(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state.db.transactions().approve(&principal, &id).await?;
    Ok(Json(transaction))
}

async fn reject(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Transaction>> {
    let transaction = state.db.transactions().reject(&principal, &id).await?;
    Ok(Json(transaction))
}
