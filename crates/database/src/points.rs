//! Append-only points ledger.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::Result;
use crate::models::{LedgerEntry, NewLedgerEntry};
use crate::validation::validate_points;

/// Append a points grant. Negative amounts are rejected.
pub async fn append(executor: impl SqliteExecutor<'_>, grant: &NewLedgerEntry<'_>) -> Result<LedgerEntry> {
    validate_points(grant.amount)?;

    let entry = sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO points_ledger (user_id, amount, reason, habit_id, entry_id)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, amount, reason, habit_id, entry_id, created_at
        "#,
    )
    .bind(grant.user_id)
    .bind(grant.amount)
    .bind(&grant.reason)
    .bind(grant.habit_id)
    .bind(grant.entry_id)
    .fetch_one(executor)
    .await?;

    tracing::debug!(
        user_id = %entry.user_id,
        amount = entry.amount,
        reason = %entry.reason,
        "Points granted"
    );
    Ok(entry)
}

/// Sum of a user's ledger rows.
pub async fn total_for_user(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(amount), 0) FROM points_ledger WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(total)
}

/// A user's ledger, newest first.
pub async fn list_for_user(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<LedgerEntry>> {
    let entries = sqlx::query_as::<_, LedgerEntry>(
        r#"
        SELECT id, user_id, amount, reason, habit_id, entry_id, created_at
        FROM points_ledger
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
