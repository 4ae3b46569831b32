//! Follower relationships.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::validation::ValidationError;

/// Follow another user.
pub async fn follow(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<()> {
    if follower_id == following_id {
        return Err(ValidationError::SelfFollow.into());
    }

    sqlx::query(
        r#"
        INSERT INTO follows (follower_id, following_id)
        VALUES (?, ?)
        "#,
    )
    .bind(follower_id)
    .bind(following_id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Follow", format!("{}/{}", follower_id, following_id)))?;

    Ok(())
}

/// Stop following a user.
pub async fn unfollow(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM follows
        WHERE follower_id = ? AND following_id = ?
        "#,
    )
    .bind(follower_id)
    .bind(following_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Follow",
            id: format!("{}/{}", follower_id, following_id),
        });
    }

    Ok(())
}

/// Check whether `follower_id` follows `following_id`.
pub async fn is_following(pool: &SqlitePool, follower_id: &str, following_id: &str) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM follows
        WHERE follower_id = ? AND following_id = ?
        "#,
    )
    .bind(follower_id)
    .bind(following_id)
    .fetch_optional(pool)
    .await?;

    Ok(result.is_some())
}

/// Follower and following counts for a user.
pub async fn follow_counts(pool: &SqlitePool, user_id: &str) -> Result<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
            (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database};

    async fn setup() -> Database {
        let db = Database::in_memory().await.unwrap();
        user::create_user(db.pool(), "u-1", "alice", "a@example.com").await.unwrap();
        user::create_user(db.pool(), "u-2", "bob", "b@example.com").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_follow_unfollow() {
        let db = setup().await;

        follow(db.pool(), "u-1", "u-2").await.unwrap();
        assert!(is_following(db.pool(), "u-1", "u-2").await.unwrap());
        assert!(!is_following(db.pool(), "u-2", "u-1").await.unwrap());
        assert_eq!(follow_counts(db.pool(), "u-2").await.unwrap(), (1, 0));

        let again = follow(db.pool(), "u-1", "u-2").await;
        assert!(matches!(again, Err(DatabaseError::AlreadyExists { .. })));

        unfollow(db.pool(), "u-1", "u-2").await.unwrap();
        let missing = unfollow(db.pool(), "u-1", "u-2").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let db = setup().await;
        let result = follow(db.pool(), "u-1", "u-1").await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }
}
