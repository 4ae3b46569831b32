//! Habit CRUD operations.

use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Habit, HabitCategory, HabitUpdate, NewHabit};
use crate::validation::{validate_description, validate_title};

const HABIT_COLUMNS: &str = "id, user_id, title, description, category, frequency, is_active, \
     is_micro, current_streak, best_streak, last_completed, created_at, updated_at";

/// Filters for listing a user's habits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitFilter {
    pub category: Option<HabitCategory>,
    pub is_active: Option<bool>,
}

/// Create a new habit for `user_id`.
pub async fn create_habit(pool: &SqlitePool, user_id: &str, new: &NewHabit) -> Result<Habit> {
    validate_title(&new.title)?;
    validate_description(&new.description)?;

    let title = new.title.trim();
    let habit = sqlx::query_as::<_, Habit>(&format!(
        r#"
        INSERT INTO habits (user_id, title, description, category, frequency, is_micro)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {HABIT_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(title)
    .bind(&new.description)
    .bind(new.category)
    .bind(new.frequency)
    .bind(new.is_micro)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Habit", title))?;

    tracing::debug!(habit_id = habit.id, user_id, "Created habit");
    Ok(habit)
}

/// Get a habit by ID regardless of owner.
pub async fn get_habit(executor: impl SqliteExecutor<'_>, id: i64) -> Result<Habit> {
    sqlx::query_as::<_, Habit>(&format!(
        r#"
        SELECT {HABIT_COLUMNS}
        FROM habits
        WHERE id = ?
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Habit",
        id: id.to_string(),
    })
}

/// Get a habit only if it belongs to `user_id`.
///
/// A habit owned by someone else is reported as not found.
pub async fn get_owned_habit(executor: impl SqliteExecutor<'_>, id: i64, user_id: &str) -> Result<Habit> {
    sqlx::query_as::<_, Habit>(&format!(
        r#"
        SELECT {HABIT_COLUMNS}
        FROM habits
        WHERE id = ? AND user_id = ?
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Habit",
        id: id.to_string(),
    })
}

/// List a user's habits, newest first.
pub async fn list_habits(pool: &SqlitePool, user_id: &str, filter: HabitFilter) -> Result<Vec<Habit>> {
    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT ");
    query.push(HABIT_COLUMNS);
    query.push(" FROM habits WHERE user_id = ");
    query.push_bind(user_id);

    if let Some(category) = filter.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
    query.push(" ORDER BY created_at DESC, id DESC");

    let habits = query.build_query_as::<Habit>().fetch_all(pool).await?;
    Ok(habits)
}

/// Apply a partial update to a habit owned by `user_id`.
pub async fn update_habit(pool: &SqlitePool, id: i64, user_id: &str, update: &HabitUpdate) -> Result<Habit> {
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(description) = &update.description {
        validate_description(description)?;
    }

    let title = update.title.as_deref().map(str::trim);
    sqlx::query(
        r#"
        UPDATE habits
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            category = COALESCE(?, category),
            frequency = COALESCE(?, frequency),
            is_active = COALESCE(?, is_active),
            is_micro = COALESCE(?, is_micro),
            updated_at = datetime('now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(title)
    .bind(update.description.as_deref())
    .bind(update.category)
    .bind(update.frequency)
    .bind(update.is_active)
    .bind(update.is_micro)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Habit", title.unwrap_or_default()))?;

    get_owned_habit(pool, id, user_id).await
}

/// Delete a habit owned by `user_id`, together with its entries.
pub async fn delete_habit(executor: impl SqliteExecutor<'_>, id: i64, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM habits
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Habit",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Persist recomputed streak fields.
pub async fn update_streak(
    executor: impl SqliteExecutor<'_>,
    id: i64,
    current_streak: i64,
    best_streak: i64,
    last_completed: Option<NaiveDate>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE habits
        SET current_streak = ?, best_streak = ?, last_completed = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(current_streak)
    .bind(best_streak)
    .bind(last_completed)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Count a user's habits.
pub async fn count_habits(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM habits WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Count active habits across all users.
pub async fn count_active_habits(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM habits WHERE is_active = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
