use std::sync::Arc;

use crate::db::Database;
use crate::transfer::TransferEngine;
use crate::user_auth::UserAuthService;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Transfer & ledger engine
    pub engine: Arc<TransferEngine>,
    /// Registration, login, tokens
    pub user_auth: Arc<UserAuthService>,
    /// PostgreSQL (None when running on the in-memory store)
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        engine: Arc<TransferEngine>,
        user_auth: Arc<UserAuthService>,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        Self {
            engine,
            user_auth,
            pg_db,
        }
    }
}
