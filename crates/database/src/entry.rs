//! Habit entry operations.
//!
//! Entries are toggled between completed and incomplete but never deleted by
//! normal operation.

use chrono::NaiveDate;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::HabitEntry;
use crate::validation::validate_note;

/// Get the entry for a habit on a date, if any.
pub async fn get_entry(
    executor: impl SqliteExecutor<'_>,
    habit_id: i64,
    date: NaiveDate,
) -> Result<Option<HabitEntry>> {
    let entry = sqlx::query_as::<_, HabitEntry>(
        r#"
        SELECT id, habit_id, date, completed, note, points_earned, completed_at
        FROM habit_entries
        WHERE habit_id = ? AND date = ?
        "#,
    )
    .bind(habit_id)
    .bind(date)
    .fetch_optional(executor)
    .await?;

    Ok(entry)
}

/// Insert the entry for a habit on a date.
///
/// Fails with `AlreadyExists` if the habit already has an entry for that day.
pub async fn insert_entry(
    executor: impl SqliteExecutor<'_>,
    habit_id: i64,
    date: NaiveDate,
    completed: bool,
    note: &str,
) -> Result<HabitEntry> {
    validate_note(note)?;

    sqlx::query_as::<_, HabitEntry>(
        r#"
        INSERT INTO habit_entries (habit_id, date, completed, note)
        VALUES (?, ?, ?, ?)
        RETURNING id, habit_id, date, completed, note, points_earned, completed_at
        "#,
    )
    .bind(habit_id)
    .bind(date)
    .bind(completed)
    .bind(note)
    .fetch_one(executor)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "HabitEntry", format!("{}/{}", habit_id, date)))
}

/// Set the completed flag of an entry. A note, when given, replaces the old one.
pub async fn set_completed(
    executor: impl SqliteExecutor<'_>,
    id: i64,
    completed: bool,
    note: Option<&str>,
) -> Result<HabitEntry> {
    if let Some(note) = note {
        validate_note(note)?;
    }

    sqlx::query_as::<_, HabitEntry>(
        r#"
        UPDATE habit_entries
        SET completed = ?,
            note = COALESCE(?, note),
            completed_at = datetime('now')
        WHERE id = ?
        RETURNING id, habit_id, date, completed, note, points_earned, completed_at
        "#,
    )
    .bind(completed)
    .bind(note)
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "HabitEntry",
        id: id.to_string(),
    })
}

/// Record the points granted for an entry.
pub async fn set_points_earned(executor: impl SqliteExecutor<'_>, id: i64, points: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE habit_entries
        SET points_earned = ?
        WHERE id = ?
        "#,
    )
    .bind(points)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Dates of a habit's completed entries, most recent first.
pub async fn completed_dates_desc(executor: impl SqliteExecutor<'_>, habit_id: i64) -> Result<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date
        FROM habit_entries
        WHERE habit_id = ? AND completed = 1
        ORDER BY date DESC
        "#,
    )
    .bind(habit_id)
    .fetch_all(executor)
    .await?;

    Ok(dates)
}

/// Dates of a habit's incomplete entries, most recent first.
pub async fn missed_dates_desc(pool: &SqlitePool, habit_id: i64, limit: i64) -> Result<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT date
        FROM habit_entries
        WHERE habit_id = ? AND completed = 0
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(habit_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(dates)
}

/// List a habit's entries within an optional inclusive date range, newest first.
pub async fn list_entries(
    pool: &SqlitePool,
    habit_id: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<HabitEntry>> {
    let entries = sqlx::query_as::<_, HabitEntry>(
        r#"
        SELECT id, habit_id, date, completed, note, points_earned, completed_at
        FROM habit_entries
        WHERE habit_id = ?
          AND (? IS NULL OR date >= ?)
          AND (? IS NULL OR date <= ?)
        ORDER BY date DESC
        "#,
    )
    .bind(habit_id)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Completed and total entry counts for one habit, optionally since a date.
pub async fn habit_counts(
    pool: &SqlitePool,
    habit_id: i64,
    since: Option<NaiveDate>,
) -> Result<EntryCounts> {
    let counts = sqlx::query_as::<_, EntryCounts>(
        r#"
        SELECT COALESCE(SUM(completed), 0) AS completed, COUNT(*) AS total
        FROM habit_entries
        WHERE habit_id = ? AND (? IS NULL OR date >= ?)
        "#,
    )
    .bind(habit_id)
    .bind(since)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

/// Completed and total entry counts across all of a user's habits.
pub async fn user_counts(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    since: Option<NaiveDate>,
) -> Result<EntryCounts> {
    let counts = sqlx::query_as::<_, EntryCounts>(
        r#"
        SELECT COALESCE(SUM(e.completed), 0) AS completed, COUNT(*) AS total
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.user_id = ? AND (? IS NULL OR e.date >= ?)
        "#,
    )
    .bind(user_id)
    .bind(since)
    .bind(since)
    .fetch_one(executor)
    .await?;

    Ok(counts)
}

/// Completed entries of a user's micro habits.
pub async fn count_completed_micro(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.user_id = ? AND h.is_micro = 1 AND e.completed = 1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Completed entries per day for a user within an inclusive range.
///
/// Days without completions are absent from the result.
pub async fn daily_completions(
    pool: &SqlitePool,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(NaiveDate, i64)>> {
    let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
        r#"
        SELECT e.date, COUNT(*) AS completions
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE h.user_id = ? AND e.completed = 1 AND e.date >= ? AND e.date <= ?
        GROUP BY e.date
        ORDER BY e.date
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Completions on `date` across all users, with the number of distinct users.
pub async fn completions_on(pool: &SqlitePool, date: NaiveDate) -> Result<(i64, i64)> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COUNT(DISTINCT h.user_id)
        FROM habit_entries e
        JOIN habits h ON h.id = e.habit_id
        WHERE e.completed = 1 AND e.date = ?
        "#,
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Completed / total entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct EntryCounts {
    pub completed: i64,
    pub total: i64,
}
