//! Community challenges.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Challenge;
use crate::validation::{validate_date_range, validate_description, validate_title};

/// Fields for creating a challenge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct NewChallenge {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub goal: i64,
}

const CHALLENGE_SELECT: &str = r#"
    SELECT c.id, c.creator_id, c.title, c.description, c.start_date, c.end_date, c.goal,
           (SELECT COUNT(*) FROM challenge_participants p WHERE p.challenge_id = c.id)
               AS participants_count,
           c.created_at
    FROM challenges c
"#;

/// Create a challenge.
pub async fn create_challenge(pool: &SqlitePool, creator_id: &str, new: &NewChallenge) -> Result<Challenge> {
    validate_title(&new.title)?;
    validate_description(&new.description)?;
    validate_date_range(new.start_date, new.end_date)?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO challenges (creator_id, title, description, start_date, end_date, goal)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(creator_id)
    .bind(new.title.trim())
    .bind(&new.description)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.goal)
    .fetch_one(pool)
    .await?;

    get_challenge(pool, id).await
}

/// Get a challenge by ID.
pub async fn get_challenge(pool: &SqlitePool, id: i64) -> Result<Challenge> {
    sqlx::query_as::<_, Challenge>(&format!("{CHALLENGE_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Challenge",
            id: id.to_string(),
        })
}

/// All challenges, newest first.
pub async fn list_challenges(pool: &SqlitePool) -> Result<Vec<Challenge>> {
    let challenges = sqlx::query_as::<_, Challenge>(&format!(
        "{CHALLENGE_SELECT} ORDER BY c.created_at DESC, c.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(challenges)
}

/// Join a challenge. Joining twice is a no-op.
///
/// Returns `true` if the user was not already a participant.
pub async fn join_challenge(pool: &SqlitePool, challenge_id: i64, user_id: &str) -> Result<bool> {
    get_challenge(pool, challenge_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO challenge_participants (challenge_id, user_id)
        VALUES (?, ?)
        ON CONFLICT(challenge_id, user_id) DO NOTHING
        "#,
    )
    .bind(challenge_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
