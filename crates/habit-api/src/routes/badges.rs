//! Badge catalogue and awards.

use axum::extract::State;
use axum::Json;
use database::{badge, AwardedBadge, Badge};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

pub async fn catalogue(State(state): State<AppState>, _current: CurrentUser) -> Result<Json<Vec<Badge>>> {
    Ok(Json(badge::list_badges(state.db.pool()).await?))
}

/// Badges the caller has earned, newest first.
pub async fn mine(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<AwardedBadge>>> {
    Ok(Json(badge::list_user_badges(state.db.pool(), current.id()).await?))
}
