//! # Saved Bank Account Endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use zargar_core::SavedBankAccount;
use zargar_db::BankAccountUpdate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bank-accounts", post(create).get(list))
        .route(
            "/api/bank-accounts/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    contact_id: Option<String>,
    bank_name: String,
    card_number: Option<String>,
    iban: Option<String>,
    description: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateRequest>,
) -> ApiResult<Json<SavedBankAccount>> {
    let account = state
        .db
        .bank_accounts()
        .create(
            &principal,
            req.contact_id,
            &req.bank_name,
            req.card_number,
            req.iban,
            req.description,
        )
        .await?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    contact_id: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SavedBankAccount>>> {
    let accounts = state
        .db
        .bank_accounts()
        .list(query.contact_id.as_deref())
        .await?;
    Ok(Json(accounts))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<SavedBankAccount>> {
    let account = state.db.bank_accounts().get_or_404(&id).await?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    bank_name: Option<String>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    card_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    iban: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    description: Option<Option<String>>,
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> ApiResult<Json<SavedBankAccount>> {
    let update = BankAccountUpdate {
        bank_name: req.bank_name,
        card_number: req.card_number,
        iban: req.iban,
        description: req.description,
    };
    let account = state
        .db
        .bank_accounts()
        .update(&principal, &id, update)
        .await?;
    Ok(Json(account))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<()>> {
    state.db.bank_accounts().delete(&principal, &id).await?;
    Ok(Json(()))
}
