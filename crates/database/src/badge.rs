//! Badge definitions and awards.
//!
//! Definitions are seeded by migration. Awards are insert-only and unique per
//! (user, badge).

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{AwardedBadge, Badge};

/// List all badge definitions.
pub async fn list_badges(pool: &SqlitePool) -> Result<Vec<Badge>> {
    let badges = sqlx::query_as::<_, Badge>(
        r#"
        SELECT code, name, description, icon, points
        FROM badges
        ORDER BY points, code
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(badges)
}

/// Get a badge definition by code.
pub async fn get_badge(executor: impl SqliteExecutor<'_>, code: &str) -> Result<Badge> {
    sqlx::query_as::<_, Badge>(
        r#"
        SELECT code, name, description, icon, points
        FROM badges
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Badge",
        id: code.to_string(),
    })
}

/// Award a badge to a user.
///
/// Returns `true` if the award is new, `false` if the user already had it.
pub async fn award_badge(executor: impl SqliteExecutor<'_>, user_id: &str, code: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_badges (user_id, badge_code)
        VALUES (?, ?)
        ON CONFLICT(user_id, badge_code) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(code)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List a user's awarded badges, newest first.
pub async fn list_user_badges(pool: &SqlitePool, user_id: &str) -> Result<Vec<AwardedBadge>> {
    let badges = sqlx::query_as::<_, AwardedBadge>(
        r#"
        SELECT ub.id, ub.user_id, ub.badge_code, b.name, b.icon, b.points, ub.awarded_at
        FROM user_badges ub
        JOIN badges b ON b.code = ub.badge_code
        WHERE ub.user_id = ?
        ORDER BY ub.awarded_at DESC, ub.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(badges)
}
