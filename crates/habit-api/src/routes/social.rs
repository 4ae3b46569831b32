//! Activity feed, comments and reactions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{feed, social, Comment, FeedItem, Reaction};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

/// Maximum feed items returned.
pub const FEED_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
}

/// The caller's items and those of users they follow, newest first.
pub async fn feed(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<FeedItem>>> {
    Ok(Json(feed::list_feed_for(state.db.pool(), current.id(), FEED_LIMIT).await?))
}

pub async fn list_comments(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Json<Vec<Comment>>> {
    let pool = state.db.pool();
    feed::get_feed_item(pool, item_id).await?;
    Ok(Json(social::list_comments(pool, item_id).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let pool = state.db.pool();
    feed::get_feed_item(pool, item_id).await?;
    let comment = social::add_comment(pool, current.id(), item_id, &req.text).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn add_reaction(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<i64>,
    Json(req): Json<ReactionRequest>,
) -> Result<(StatusCode, Json<Reaction>)> {
    let pool = state.db.pool();
    feed::get_feed_item(pool, item_id).await?;
    let reaction = social::add_reaction(pool, current.id(), item_id, &req.emoji).await?;
    Ok((StatusCode::CREATED, Json(reaction)))
}

pub async fn remove_reaction(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(item_id): Path<i64>,
    Query(req): Query<ReactionRequest>,
) -> Result<StatusCode> {
    social::remove_reaction(state.db.pool(), current.id(), item_id, &req.emoji).await?;
    Ok(StatusCode::NO_CONTENT)
}
