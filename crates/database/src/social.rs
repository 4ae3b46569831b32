//! Comments and reactions on feed items.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Comment, Reaction};
use crate::validation::{validate_comment, validate_emoji};

/// Comment on a feed item.
pub async fn add_comment(pool: &SqlitePool, user_id: &str, feed_item_id: i64, text: &str) -> Result<Comment> {
    validate_comment(text)?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (user_id, feed_item_id, text)
        VALUES (?, ?, ?)
        RETURNING id, user_id, feed_item_id, text, created_at
        "#,
    )
    .bind(user_id)
    .bind(feed_item_id)
    .bind(text.trim())
    .fetch_one(pool)
    .await?;

    Ok(comment)
}

/// Comments on a feed item, oldest first.
pub async fn list_comments(pool: &SqlitePool, feed_item_id: i64) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, user_id, feed_item_id, text, created_at
        FROM comments
        WHERE feed_item_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(feed_item_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// React to a feed item. Each user may use each emoji once per item.
pub async fn add_reaction(pool: &SqlitePool, user_id: &str, feed_item_id: i64, emoji: &str) -> Result<Reaction> {
    validate_emoji(emoji)?;

    let emoji = emoji.trim();
    sqlx::query_as::<_, Reaction>(
        r#"
        INSERT INTO reactions (user_id, feed_item_id, emoji)
        VALUES (?, ?, ?)
        RETURNING id, user_id, feed_item_id, emoji, created_at
        "#,
    )
    .bind(user_id)
    .bind(feed_item_id)
    .bind(emoji)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Reaction", format!("{}/{}", feed_item_id, emoji)))
}

/// Remove a reaction.
pub async fn remove_reaction(pool: &SqlitePool, user_id: &str, feed_item_id: i64, emoji: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM reactions
        WHERE user_id = ? AND feed_item_id = ? AND emoji = ?
        "#,
    )
    .bind(user_id)
    .bind(feed_item_id)
    .bind(emoji.trim())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Reaction",
            id: format!("{}/{}", feed_item_id, emoji),
        });
    }

    Ok(())
}

/// Reactions on a feed item.
pub async fn list_reactions(pool: &SqlitePool, feed_item_id: i64) -> Result<Vec<Reaction>> {
    let reactions = sqlx::query_as::<_, Reaction>(
        r#"
        SELECT id, user_id, feed_item_id, emoji, created_at
        FROM reactions
        WHERE feed_item_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(feed_item_id)
    .fetch_all(pool)
    .await?;

    Ok(reactions)
}
