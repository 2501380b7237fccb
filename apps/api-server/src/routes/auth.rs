//! # Auth Endpoints
//!
//! Login and current-user introspection.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user_id: String,
    username: String,
    role: String,
    permissions: Vec<String>,
}

/// Authenticates credentials and issues an access token.
///
/// Unknown usernames and wrong passwords return the same message so the
/// endpoint cannot be used to enumerate accounts.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let users = state.db.users();
    let user = users.get_by_username(&req.username).await?;

    let Some(user) = user else {
        tracing::warn!(username = %req.username, "Login failed: unknown user");
        return Err(ApiError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    };

    if !user.is_active {
        return Err(ApiError::Unauthorized("account is deactivated".to_string()));
    }

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(username = %req.username, "Login failed: bad password");
        return Err(ApiError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    }

    let token = state.jwt.issue(&user.id)?;
    let permissions = users.permissions(&user.id).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role.as_str().to_string(),
        permissions,
    }))
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: String,
    role: String,
    permissions: Vec<String>,
}

/// Returns the caller's identity as the server currently sees it.
async fn me(AuthUser(principal): AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: principal.user_id.clone(),
        role: principal.role.as_str().to_string(),
        permissions: principal.permissions.clone(),
    })
}
