//! # Route Assembly
//!
//! One module per resource; each contributes a `Router<AppState>`
//! nested under `/api`. Handlers stay thin: authenticate, call one
//! repository or engine method, serialize.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod audit_logs;
mod auth;
mod bank_accounts;
mod contacts;
mod inventory;
mod investors;
mod items;
mod ledgers;
mod patch;
mod payments;
mod transactions;
mod users;

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(users::router())
        .merge(contacts::router())
        .merge(items::router())
        .merge(transactions::router())
        .merge(payments::router())
        .merge(inventory::router())
        .merge(ledgers::router())
        .merge(bank_accounts::router())
        .merge(investors::router())
        .merge(audit_logs::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe; also checks the database connection.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let db_ok = state.db.health_check().await;
    Json(json!({ "status": if db_ok { "ok" } else { "degraded" }, "database": db_ok }))
}
