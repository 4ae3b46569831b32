//! Habit stacks: "after <anchor>, I will <habit>".
//!
//! Both habits of a stack belong to the stack's owner. A habit can follow a
//! given anchor only once; `position` orders the habits following one anchor.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::habit;
use crate::models::{HabitStack, NewHabitStack};
use crate::validation::{validate_position, ValidationError};

const STACK_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.habit_id, h.title AS habit_title,
           s.anchor_habit_id, a.title AS anchor_habit_title, s.position, s.created_at
    FROM habit_stacks s
    JOIN habits h ON h.id = s.habit_id
    JOIN habits a ON a.id = s.anchor_habit_id
"#;

/// Stack `new.habit_id` after `new.anchor_habit_id`.
pub async fn create_stack(pool: &SqlitePool, user_id: &str, new: &NewHabitStack) -> Result<HabitStack> {
    if new.habit_id == new.anchor_habit_id {
        return Err(ValidationError::SelfStack.into());
    }
    validate_position(new.position)?;

    habit::get_owned_habit(pool, new.habit_id, user_id).await?;
    habit::get_owned_habit(pool, new.anchor_habit_id, user_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO habit_stacks (user_id, habit_id, anchor_habit_id, position)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(new.habit_id)
    .bind(new.anchor_habit_id)
    .bind(new.position)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        DatabaseError::on_insert(e, "HabitStack", format!("{}/{}", new.anchor_habit_id, new.habit_id))
    })?;

    tracing::debug!(stack_id = id, user_id, "Created habit stack");
    get_stack(pool, id, user_id).await
}

/// Get a stack owned by `user_id`.
pub async fn get_stack(executor: impl SqliteExecutor<'_>, id: i64, user_id: &str) -> Result<HabitStack> {
    sqlx::query_as::<_, HabitStack>(&format!("{STACK_SELECT} WHERE s.id = ? AND s.user_id = ?"))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "HabitStack",
            id: id.to_string(),
        })
}

/// A user's stacks grouped by anchor, in position order.
pub async fn list_stacks(pool: &SqlitePool, user_id: &str) -> Result<Vec<HabitStack>> {
    let stacks = sqlx::query_as::<_, HabitStack>(&format!(
        "{STACK_SELECT} WHERE s.user_id = ? ORDER BY s.anchor_habit_id, s.position, s.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(stacks)
}

/// Move a stack to `position`.
pub async fn set_position(pool: &SqlitePool, id: i64, user_id: &str, position: i64) -> Result<HabitStack> {
    validate_position(position)?;

    let result = sqlx::query(
        r#"
        UPDATE habit_stacks
        SET position = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(position)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "HabitStack",
            id: id.to_string(),
        });
    }

    get_stack(pool, id, user_id).await
}

/// Remove a stack. The habits themselves are untouched.
pub async fn delete_stack(pool: &SqlitePool, id: i64, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM habit_stacks
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "HabitStack",
            id: id.to_string(),
        });
    }

    Ok(())
}
