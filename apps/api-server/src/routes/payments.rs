//! # Payment Endpoints
//!
//! Draft CRUD plus the approval transitions that move ledger debt, the
//! cash balance, and investments. Update replaces the full mutable
//! field set so the engine can re-validate settlement links as a whole.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use zargar_core::{ApprovalStatus, Payment, PaymentDirection, PaymentMethod};
use zargar_db::{PaymentInput, PaymentSearch};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments", post(create).get(search))
        .route(
            "/api/payments/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/api/payments/{id}/approve", post(approve))
        .route("/api/payments/{id}/reject", post(reject))
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    amount: i64,
    payment_method: PaymentMethod,
    direction: PaymentDirection,
    description: Option<String>,
    photo_holder_id: Option<String>,
    investor_id: Option<String>,
    transaction_id: Option<String>,
    account_ledger_id: Option<String>,
    saved_bank_account_id: Option<String>,
    contact_id: Option<String>,
}

impl From<PaymentRequest> for PaymentInput {
    fn from(req: PaymentRequest) -> Self {
        PaymentInput {
            amount: req.amount,
            payment_method: req.payment_method,
            direction: req.direction,
            description: req.description,
            photo_holder_id: req.photo_holder_id,
            investor_id: req.investor_id,
            transaction_id: req.transaction_id,
            account_ledger_id: req.account_ledger_id,
            saved_bank_account_id: req.saved_bank_account_id,
            contact_id: req.contact_id,
        }
    }
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let payment = state.db.payments().create(&principal, req.into()).await?;
    Ok(Json(payment))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    recorder_id: Option<String>,
    status: Option<ApprovalStatus>,
    direction: Option<PaymentDirection>,
    payment_method: Option<PaymentMethod>,
    contact_id: Option<String>,
    account_ledger_id: Option<String>,
    transaction_id: Option<String>,
    description: Option<String>,
    created_after: Option<DateTime<Utc>>,
    created_before: Option<DateTime<Utc>>,
    near_amount: Option<i64>,
    #[serde(default)]
    skip: i64,
    #[serde(default)]
    limit: i64,
}

async fn search(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let filter = PaymentSearch {
        recorder_id: query.recorder_id,
        status: query.status,
        direction: query.direction,
        payment_method: query.payment_method,
        contact_id: query.contact_id,
        account_ledger_id: query.account_ledger_id,
        transaction_id: query.transaction_id,
        description: query.description,
        created_after: query.created_after,
        created_before: query.created_before,
        near_amount: query.near_amount,
        skip: query.skip,
        limit: query.limit,
    };
    let payments = state.db.payments().search(&principal, &filter).await?;
    Ok(Json(payments))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    let payment = state.db.payments().get(&principal, &id).await?;
    Ok(Json(payment))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let payment = state
        .db
        .payments()
        .update(&principal, &id, req.into())
        .await?;
    Ok(Json(payment))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<()>> {
    state.db.payments().delete(&principal, &id).await?;
    Ok(Json(()))
}

async fn approve(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    let payment = state.db.payments().approve(&principal, &id).await?;
    Ok(Json(payment))
}

async fn reject(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Payment>> {
    let payment = state.db.payments().reject(&principal, &id).await?;
    Ok(Json(payment))
}
