//! Accountability contracts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{contract, HabitContract, NewHabitContract};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContractStatus {
    pub active: bool,
}

/// Contracts the caller created or partners in.
pub async fn list_contracts(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<HabitContract>>> {
    Ok(Json(contract::list_contracts(state.db.pool(), current.id()).await?))
}

pub async fn create_contract(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(new): Json<NewHabitContract>,
) -> Result<(StatusCode, Json<HabitContract>)> {
    let created = contract::create_contract(state.db.pool(), current.id(), &new).await?;
    info!(
        contract_id = created.id,
        creator = %current.id(),
        partner = %created.partner_id,
        "Contract created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn set_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ContractStatus>,
) -> Result<Json<HabitContract>> {
    Ok(Json(contract::set_active(state.db.pool(), id, current.id(), req.active).await?))
}
