//! Habit stacks.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{stack, HabitStack, NewHabitStack};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MoveStack {
    pub position: i64,
}

pub async fn list_stacks(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<HabitStack>>> {
    Ok(Json(stack::list_stacks(state.db.pool(), current.id()).await?))
}

pub async fn create_stack(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(new): Json<NewHabitStack>,
) -> Result<(StatusCode, Json<HabitStack>)> {
    let created = stack::create_stack(state.db.pool(), current.id(), &new).await?;
    info!(user_id = %current.id(), stack_id = created.id, "Habit stacked");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn move_stack(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<MoveStack>,
) -> Result<Json<HabitStack>> {
    Ok(Json(stack::set_position(state.db.pool(), id, current.id(), req.position).await?))
}

pub async fn delete_stack(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    stack::delete_stack(state.db.pool(), id, current.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
