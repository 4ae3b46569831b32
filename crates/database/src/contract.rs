//! Accountability contracts between a habit's owner and a partner.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{HabitContract, NewHabitContract};
use crate::validation::{validate_terms, ValidationError};
use crate::{habit, user};

const CONTRACT_SELECT: &str = r#"
    SELECT c.id, c.creator_id, c.partner_id, u.username AS partner_username,
           c.habit_id, h.title AS habit_title, c.terms, c.active, c.created_at
    FROM habit_contracts c
    JOIN users u ON u.id = c.partner_id
    JOIN habits h ON h.id = c.habit_id
"#;

/// Create a contract on one of the creator's habits.
pub async fn create_contract(pool: &SqlitePool, creator_id: &str, new: &NewHabitContract) -> Result<HabitContract> {
    if new.partner_id == creator_id {
        return Err(ValidationError::SelfPartner.into());
    }
    validate_terms(&new.terms)?;

    habit::get_owned_habit(pool, new.habit_id, creator_id).await?;
    user::get_user(pool, &new.partner_id).await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO habit_contracts (creator_id, partner_id, habit_id, terms)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(creator_id)
    .bind(&new.partner_id)
    .bind(new.habit_id)
    .bind(new.terms.trim())
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "HabitContract", format!("{}/{}", new.partner_id, new.habit_id)))?;

    tracing::debug!(contract_id = id, creator_id, partner_id = %new.partner_id, "Created contract");
    get_contract(pool, id).await
}

pub async fn get_contract(pool: &SqlitePool, id: i64) -> Result<HabitContract> {
    sqlx::query_as::<_, HabitContract>(&format!("{CONTRACT_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "HabitContract",
            id: id.to_string(),
        })
}

/// Contracts the user created or is a partner in, newest first.
pub async fn list_contracts(pool: &SqlitePool, user_id: &str) -> Result<Vec<HabitContract>> {
    let contracts = sqlx::query_as::<_, HabitContract>(&format!(
        "{CONTRACT_SELECT} WHERE c.creator_id = ?1 OR c.partner_id = ?1 ORDER BY c.created_at DESC, c.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(contracts)
}

/// Activate or end a contract. Only its creator may.
pub async fn set_active(pool: &SqlitePool, id: i64, creator_id: &str, active: bool) -> Result<HabitContract> {
    let result = sqlx::query(
        r#"
        UPDATE habit_contracts
        SET active = ?
        WHERE id = ? AND creator_id = ?
        "#,
    )
    .bind(active)
    .bind(id)
    .bind(creator_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "HabitContract",
            id: id.to_string(),
        });
    }

    get_contract(pool, id).await
}
