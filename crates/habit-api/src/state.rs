//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use habit_engine::{Clock, DatabaseFeed, Reporter, StreakEngine};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Completion recording.
    pub engine: Arc<StreakEngine>,
    /// Read-only rollups.
    pub reporter: Arc<Reporter>,
    /// Bearer token required on `/api` routes, if any.
    pub api_token: Option<String>,
}

impl AppState {
    /// Create new application state. Feed events are stored in the same database.
    pub fn new(db: Database, clock: Arc<dyn Clock>, api_token: Option<String>) -> Self {
        let feed = Arc::new(DatabaseFeed::new(db.clone()));
        Self {
            engine: Arc::new(StreakEngine::new(db.clone(), clock.clone(), feed)),
            reporter: Arc::new(Reporter::new(db.clone(), clock)),
            db,
            api_token,
        }
    }
}
