//! Social feed items.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{FeedItem, FeedKind};

/// A feed item to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedItem {
    pub user_id: String,
    pub kind: FeedKind,
    pub message: String,
    pub habit_id: Option<i64>,
    pub badge_code: Option<String>,
    pub challenge_id: Option<i64>,
    pub entry_id: Option<i64>,
}

const FEED_SELECT: &str = r#"
    SELECT f.id, f.user_id, u.username, f.kind, f.message, f.habit_id, f.badge_code,
           f.challenge_id, f.entry_id,
           (SELECT COUNT(*) FROM comments c WHERE c.feed_item_id = f.id) AS comment_count,
           (SELECT COUNT(*) FROM reactions r WHERE r.feed_item_id = f.id) AS reaction_count,
           f.created_at
    FROM feed_items f
    JOIN users u ON u.id = f.user_id
"#;

/// Insert a feed item and return its ID.
pub async fn create_feed_item(executor: impl SqliteExecutor<'_>, item: &NewFeedItem) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO feed_items (user_id, kind, message, habit_id, badge_code, challenge_id, entry_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&item.user_id)
    .bind(item.kind)
    .bind(&item.message)
    .bind(item.habit_id)
    .bind(item.badge_code.as_deref())
    .bind(item.challenge_id)
    .bind(item.entry_id)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Get a feed item by ID.
pub async fn get_feed_item(pool: &SqlitePool, id: i64) -> Result<FeedItem> {
    sqlx::query_as::<_, FeedItem>(&format!("{FEED_SELECT} WHERE f.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "FeedItem",
            id: id.to_string(),
        })
}

/// Feed for a user: their own items and those of users they follow, newest first.
pub async fn list_feed_for(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<FeedItem>> {
    let items = sqlx::query_as::<_, FeedItem>(&format!(
        r#"
        {FEED_SELECT}
        WHERE f.user_id = ?1
           OR f.user_id IN (SELECT following_id FROM follows WHERE follower_id = ?1)
        ORDER BY f.created_at DESC, f.id DESC
        LIMIT ?2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(items)
}
