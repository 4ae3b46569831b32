//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    pub database: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = if database_reachable(&state).await {
        "ok"
    } else {
        "unavailable"
    };

    Json(Health {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}

async fn database_reachable(state: &AppState) -> bool {
    database::user::count_users(state.db.pool()).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;

    #[tokio::test]
    async fn test_health() {
        let state = test_support::state().await;
        let Json(health) = health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "ok");
    }
}
