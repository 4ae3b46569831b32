//! User profile storage.
//!
//! The profile is a materialized view over the points ledger, the user's
//! entries and the user's habits. [`refresh_profile`] recomputes every
//! counter from those sources instead of incrementing them in place, so the
//! stored totals can never drift from the ledger.

use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{ProfileSettings, UserProfile};

/// Points needed per level.
pub const POINTS_PER_LEVEL: i64 = 100;

/// Level reached with `total_points`: `max(1, total_points / 100 + 1)`.
pub const fn level_for_points(total_points: i64) -> i64 {
    let level = total_points.div_euclid(POINTS_PER_LEVEL) + 1;
    if level < 1 {
        1
    } else {
        level
    }
}

/// Get a user's profile.
pub async fn get_profile(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<UserProfile> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT user_id, total_points, total_completions, current_streak, best_streak,
               level, profile_public, show_statistics, created_at, updated_at
        FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "UserProfile",
        id: user_id.to_string(),
    })
}

#[derive(sqlx::FromRow)]
struct ProfileSources {
    total_points: i64,
    total_completions: i64,
    current_streak: i64,
    best_streak: i64,
}

/// Recompute a profile from the ledger, entries and habits.
///
/// Call inside the transaction that changed any of those sources.
pub async fn refresh_profile(conn: &mut SqliteConnection, user_id: &str) -> Result<UserProfile> {
    let sources = sqlx::query_as::<_, ProfileSources>(
        r#"
        SELECT
            (SELECT COALESCE(SUM(amount), 0) FROM points_ledger WHERE user_id = ?1) AS total_points,
            (SELECT COUNT(*)
               FROM habit_entries e
               JOIN habits h ON h.id = e.habit_id
              WHERE h.user_id = ?1 AND e.completed = 1) AS total_completions,
            (SELECT COALESCE(MAX(current_streak), 0) FROM habits WHERE user_id = ?1) AS current_streak,
            (SELECT COALESCE(MAX(best_streak), 0) FROM habits WHERE user_id = ?1) AS best_streak
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let result = sqlx::query(
        r#"
        UPDATE user_profiles
        SET total_points = ?, total_completions = ?, current_streak = ?, best_streak = ?,
            level = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(sources.total_points)
    .bind(sources.total_completions)
    .bind(sources.current_streak)
    .bind(sources.best_streak)
    .bind(level_for_points(sources.total_points))
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "UserProfile",
            id: user_id.to_string(),
        });
    }

    get_profile(&mut *conn, user_id).await
}

/// Overwrite the stored level.
pub async fn set_level(executor: impl SqliteExecutor<'_>, user_id: &str, level: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE user_profiles
        SET level = ?, updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(level)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Change the privacy settings.
pub async fn update_settings(pool: &SqlitePool, user_id: &str, settings: &ProfileSettings) -> Result<UserProfile> {
    let result = sqlx::query(
        r#"
        UPDATE user_profiles
        SET profile_public = COALESCE(?, profile_public),
            show_statistics = COALESCE(?, show_statistics),
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(settings.profile_public)
    .bind(settings.show_statistics)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "UserProfile",
            id: user_id.to_string(),
        });
    }

    get_profile(pool, user_id).await
}
