//! Community challenges.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::challenge::{self, NewChallenge};
use database::Challenge;
use serde::Serialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub challenge_id: i64,
    /// False when the caller had already joined.
    pub joined: bool,
}

pub async fn list_challenges(State(state): State<AppState>, _current: CurrentUser) -> Result<Json<Vec<Challenge>>> {
    Ok(Json(challenge::list_challenges(state.db.pool()).await?))
}

pub async fn create_challenge(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(new): Json<NewChallenge>,
) -> Result<(StatusCode, Json<Challenge>)> {
    let created = challenge::create_challenge(state.db.pool(), current.id(), &new).await?;
    info!(challenge_id = created.id, creator = %current.id(), "Challenge created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn join_challenge(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<JoinResponse>> {
    let joined = challenge::join_challenge(state.db.pool(), id, current.id()).await?;
    Ok(Json(JoinResponse {
        challenge_id: id,
        joined,
    }))
}
