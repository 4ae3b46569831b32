//! Statistics, leaderboard, level and points.

use axum::extract::{Query, State};
use axum::Json;
use database::{points, LedgerEntry};
use habit_engine::{
    CommunityStats, DailyCompletions, LeaderboardEntry, LeaderboardWindow, LevelProgress,
    StreakSummary, UserStatistics,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

const DEFAULT_POINTS_LIMIT: i64 = 50;
const MAX_POINTS_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// `weekly` (default) or `monthly`.
    #[serde(default, rename = "type")]
    pub window: LeaderboardWindow,
}

#[derive(Debug, Default, Deserialize)]
pub struct PointsQuery {
    pub limit: Option<i64>,
}

pub async fn statistics(State(state): State<AppState>, current: CurrentUser) -> Result<Json<UserStatistics>> {
    Ok(Json(state.reporter.user_statistics(current.id()).await?))
}

pub async fn weekly(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<DailyCompletions>>> {
    Ok(Json(state.reporter.weekly_series(current.id()).await?))
}

pub async fn monthly(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<DailyCompletions>>> {
    Ok(Json(state.reporter.monthly_series(current.id()).await?))
}

pub async fn streaks(State(state): State<AppState>, current: CurrentUser) -> Result<Json<StreakSummary>> {
    Ok(Json(state.reporter.streak_summary(current.id()).await?))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.reporter.leaderboard(query.window).await?))
}

pub async fn community(State(state): State<AppState>, _current: CurrentUser) -> Result<Json<CommunityStats>> {
    Ok(Json(state.reporter.community_stats().await?))
}

pub async fn level(State(state): State<AppState>, current: CurrentUser) -> Result<Json<LevelProgress>> {
    Ok(Json(state.reporter.level_progress(current.id()).await?))
}

/// The caller's ledger, newest first.
pub async fn points(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<PointsQuery>,
) -> Result<Json<Vec<LedgerEntry>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_POINTS_LIMIT)
        .clamp(1, MAX_POINTS_LIMIT);
    let entries = points::list_for_user(state.db.pool(), current.id(), limit).await?;
    Ok(Json(entries))
}
