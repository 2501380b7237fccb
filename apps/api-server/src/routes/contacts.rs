//! # Contact Endpoints
//!
//! Visibility is ownership-scoped: without the `contact_read_all` grant
//! a user sees only contacts they created.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use zargar_core::Contact;
use zargar_db::ContactUpdate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/contacts", post(create).get(list))
        .route(
            "/api/contacts/{id}",
            get(get_by_id).put(update).delete(delete),
        )
}

#[derive(Debug, Deserialize)]
struct CreateContactRequest {
    name: String,
    contact_type: String,
    phone: Option<String>,
    note: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<CreateContactRequest>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .db
        .contacts()
        .create(&principal, &req.name, &req.contact_type, req.phone, req.note)
        .await?;
    Ok(Json(contact))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    name: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Contact>>> {
    let contacts = state
        .db
        .contacts()
        .list(&principal, query.name.as_deref())
        .await?;
    Ok(Json(contacts))
}

async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let contact = state.db.contacts().get(&principal, &id).await?;
    Ok(Json(contact))
}

/// Patch semantics: absent field = unchanged; `phone`/`note` may be set
/// to null explicitly.
#[derive(Debug, Deserialize)]
struct UpdateContactRequest {
    name: Option<String>,
    contact_type: Option<String>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::patch::double_option")]
    note: Option<Option<String>>,
}

async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> ApiResult<Json<Contact>> {
    let update = ContactUpdate {
        name: req.name,
        contact_type: req.contact_type,
        phone: req.phone,
        note: req.note,
    };
    let contact = state.db.contacts().update(&principal, &id, update).await?;
    Ok(Json(contact))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<()>> {
    state.db.contacts().delete(&principal, &id).await?;
    Ok(Json(()))
}
