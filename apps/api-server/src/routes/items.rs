//! # Item Catalog Endpoints
//!
//! The asset catalog and per-direction financial profiles. Mutations
//! are admin-only; the catalog itself is readable by everyone.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use zargar_core::{AssetKind, Item, ItemFinancialProfile, TransactionType};
use zargar_db::ProfileDefaults;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/items", post(create).get(list))
        .route("/api/items/{id}", get(get_by_id).put(update))
        .route("/api/items/{id}/profiles", get(profiles).put(upsert_profile))
}

#[derive(Debug, Deserialize)]
struct CreateItemRequest {
    name: AssetKind,
    name_fa: String,
    category: String,
    description: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateItemRequest>,
) -> ApiResult<Json<Item>> {
    let item = state
        .db
        .items()
        .create(&principal, req.name, &req.name_fa, &req.category, req.description)
        .await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    active_only: bool,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Item>>> {
    let items = state.db.items().list(query.active_only).await?;
    Ok(Json(items))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Item>> {
    let item = state.db.items().get_or_404(&id).await?;
    Ok(Json(item))
}

/// Metadata only: the asset name and measurement kind are immutable.
#[derive(Debug, Deserialize)]
struct UpdateItemRequest {
    name_fa: Option<String>,
    category: Option<String>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    description: Option<Option<String>>,
    is_active: Option<bool>,
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<Item>> {
    let item = state
        .db
        .items()
        .update_metadata(
            &principal,
            &id,
            req.name_fa,
            req.category,
            req.description,
            req.is_active,
        )
        .await?;
    Ok(Json(item))
}

async fn profiles(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ItemFinancialProfile>>> {
    let profiles = state.db.items().profiles_for_item(&id).await?;
    Ok(Json(profiles))
}

#[derive(Debug, Deserialize)]
struct UpsertProfileRequest {
    transaction_type: TransactionType,
    karat: Option<Decimal>,
    ojrat: Option<Decimal>,
    profit: Option<Decimal>,
    tax: Option<Decimal>,
}

async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpsertProfileRequest>,
) -> ApiResult<Json<ItemFinancialProfile>> {
    let defaults = ProfileDefaults {
        karat: req.karat,
        ojrat: req.ojrat,
        profit: req.profit,
        tax: req.tax,
    };
    let profile = state
        .db
        .items()
        .upsert_profile(&principal, &id, req.transaction_type, defaults)
        .await?;
    Ok(Json(profile))
}
