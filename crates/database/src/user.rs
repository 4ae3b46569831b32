//! User operations.
//!
//! A user's profile row is created in the same transaction as the user, so
//! every user always has exactly one profile.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{User, UserSummary};
use crate::validation::{validate_email, validate_search, validate_username};

/// Create a new user and their empty profile.
pub async fn create_user(pool: &SqlitePool, id: &str, username: &str, email: &str) -> Result<User> {
    validate_username(username)?;
    validate_email(email)?;

    let username = username.trim();
    let email = email.trim().to_lowercase();

    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email)
        VALUES (?, ?, ?)
        RETURNING id, username, email, created_at
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(&email)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "User", username))?;

    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id)
        VALUES (?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "UserProfile", id))?;

    tx.commit().await?;

    tracing::debug!(user_id = %user.id, username = %user.username, "Created user");
    Ok(user)
}

/// Get a user by ID.
pub async fn get_user(executor: impl SqliteExecutor<'_>, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by username.
pub async fn get_user_by_username(executor: impl SqliteExecutor<'_>, username: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: username.to_string(),
    })
}

/// Most results returned by [`search_public_users`].
pub const SEARCH_LIMIT: i64 = 20;

/// Find public profiles whose username or email contains `query`.
///
/// The caller is never listed. Matching ignores ASCII case.
pub async fn search_public_users(
    pool: &SqlitePool,
    caller_id: &str,
    query: &str,
) -> Result<Vec<UserSummary>> {
    let query = validate_search(query)?;
    let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    let pattern = format!("%{}%", escaped);

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, u.created_at
        FROM users u
        JOIN user_profiles p ON p.user_id = u.id
        WHERE p.profile_public = 1
          AND u.id <> ?1
          AND (u.username LIKE ?2 ESCAPE '\' OR u.email LIKE ?2 ESCAPE '\')
        ORDER BY u.username
        LIMIT ?3
        "#,
    )
    .bind(caller_id)
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
