//! Cross-user aggregate queries used by reporting.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::error::Result;

/// Per-user leaderboard inputs, unranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub username: String,
    /// Completed entries dated on or after the window start.
    pub window_completions: i64,
    /// Highest `current_streak` across the user's active habits.
    pub current_streak: i64,
    pub total_points: i64,
}

/// Leaderboard inputs for every user.
pub async fn leaderboard_rows(pool: &SqlitePool, since: NaiveDate) -> Result<Vec<LeaderboardRow>> {
    let rows = sqlx::query_as::<_, LeaderboardRow>(
        r#"
        SELECT u.id AS user_id,
               u.username,
               (SELECT COUNT(*)
                  FROM habit_entries e
                  JOIN habits h ON h.id = e.habit_id
                 WHERE h.user_id = u.id AND e.completed = 1 AND e.date >= ?)
                   AS window_completions,
               (SELECT COALESCE(MAX(h.current_streak), 0)
                  FROM habits h
                 WHERE h.user_id = u.id AND h.is_active = 1) AS current_streak,
               COALESCE(p.total_points, 0) AS total_points
        FROM users u
        LEFT JOIN user_profiles p ON p.user_id = u.id
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
