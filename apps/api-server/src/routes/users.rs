//! # User Management Endpoints
//!
//! Account CRUD and fine-grained permission grants. Everything here is
//! admin-only except reading your own account.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zargar_core::principal::ALL_PERMISSIONS;
use zargar_core::{authorize, Access, Role, User};

use crate::auth::{hash_password, AuthUser};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create).get(list))
        .route("/api/users/{id}", get(get_by_id))
        .route("/api/users/{id}/active", put(set_active))
        .route("/api/users/{id}/password", put(set_password))
        .route(
            "/api/users/{id}/permissions",
            get(list_permissions).post(grant_permission),
        )
        .route(
            "/api/users/{id}/permissions/{permission}",
            axum::routing::delete(revoke_permission),
        )
        .route("/api/permissions", get(known_permissions))
}

/// The fixed catalog of grantable permission names.
async fn known_permissions(AuthUser(_principal): AuthUser) -> Json<Vec<&'static str>> {
    Json(ALL_PERMISSIONS.to_vec())
}

/// The JSON shape for a user. Never exposes the password hash.
#[derive(Debug, Serialize)]
struct UserResponse {
    id: String,
    username: String,
    role: Role,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    username: String,
    password: String,
    role: Role,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    authorize(&principal, Access::AdminOnly, None)?;

    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .users()
        .create(&principal.user_id, &req.username, &password_hash, req.role)
        .await?;

    Ok(Json(user.into()))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    authorize(&principal, Access::AdminOnly, None)?;
    let users = state.db.users().list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    authorize(&principal, Access::OwnerOrAdmin, Some(&id))?;
    let user = state.db.users().get_or_404(&id).await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    is_active: bool,
}

async fn set_active(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> ApiResult<Json<UserResponse>> {
    authorize(&principal, Access::AdminOnly, None)?;
    let user = state
        .db
        .users()
        .set_active(&principal.user_id, &id, req.is_active)
        .await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
struct SetPasswordRequest {
    password: String,
}

/// Users may change their own password; admins may reset anyone's.
async fn set_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetPasswordRequest>,
) -> ApiResult<Json<()>> {
    authorize(&principal, Access::OwnerOrAdmin, Some(&id))?;
    let password_hash = hash_password(&req.password)?;
    state
        .db
        .users()
        .update_password(&principal.user_id, &id, &password_hash)
        .await?;
    Ok(Json(()))
}

async fn list_permissions(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    authorize(&principal, Access::OwnerOrAdmin, Some(&id))?;
    let permissions = state.db.users().permissions(&id).await?;
    Ok(Json(permissions))
}

#[derive(Debug, Deserialize)]
struct GrantRequest {
    permission: String,
}

async fn grant_permission(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<GrantRequest>,
) -> ApiResult<Json<()>> {
    authorize(&principal, Access::AdminOnly, None)?;
    state
        .db
        .users()
        .grant_permission(&principal.user_id, &id, &req.permission)
        .await?;
    Ok(Json(()))
}

async fn revoke_permission(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((id, permission)): Path<(String, String)>,
) -> ApiResult<Json<()>> {
    authorize(&principal, Access::AdminOnly, None)?;
    state
        .db
        .users()
        .revoke_permission(&principal.user_id, &id, &permission)
        .await?;
    Ok(Json(()))
}
