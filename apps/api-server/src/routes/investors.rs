//! # Investor Endpoints
//!
//! Profile management is admin-only. Investors reach their own
//! investment list; Investment rows themselves are derived data and
//! have no write endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use zargar_core::{authorize, Access, Investment, Investor, InvestorStatus};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/investors", post(create).get(list))
        .route("/api/investors/{id}", get(get_by_id))
        .route("/api/investors/{id}/status", put(set_status))
        .route("/api/investors/{id}/investments", get(investments))
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    user_id: String,
    contact_id: String,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateRequest>,
) -> ApiResult<Json<Investor>> {
    let investor = state
        .db
        .investors()
        .create(&principal, &req.user_id, &req.contact_id)
        .await?;
    Ok(Json(investor))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> ApiResult<Json<Vec<Investor>>> {
    authorize(&principal, Access::AdminOnly, None)?;
    let investors = state.db.investors().list().await?;
    Ok(Json(investors))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Investor>> {
    let investor = state.db.investors().get_or_404(&id).await?;
    authorize(&principal, Access::OwnerOrAdmin, Some(&investor.user_id))?;
    Ok(Json(investor))
}

#[derive(Debug, Deserialize)]
struct SetStatusRequest {
    status: InvestorStatus,
}

async fn set_status(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<Investor>> {
    let investor = state
        .db
        .investors()
        .set_status(&principal, &id, req.status)
        .await?;
    Ok(Json(investor))
}

async fn investments(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Investment>>> {
    let investments = state.db.investors().investments(&principal, &id).await?;
    Ok(Json(investments))
}
