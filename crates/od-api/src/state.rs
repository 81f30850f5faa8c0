//! Application state shared across handlers.

use od_core::db::DbPool;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DbPool>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(db: DbPool) -> Self {
        Self { db: Arc::new(db) }
    }
}
