//! # Shared Server State
//!
//! One cloneable state handed to every handler. The database pool is
//! internally reference-counted, so cloning is cheap.

use zargar_db::Database;

use crate::auth::JwtManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState { db, jwt }
    }
}
