//! Registration, profiles, privacy, search and follows.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::{
    follow, user, user_profile, DatabaseError, ProfileSettings, User, UserProfile, UserSummary,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, CurrentUser};
use crate::error::Result;
use crate::state::AppState;

/// Request to register a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Identity-provider ID. A random UUID is assigned when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    pub email: String,
}

/// The caller with their profile and follow counts.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub profile: UserProfile,
    pub followers: i64,
    pub following: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Another user's profile as the caller may see it.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub user: UserSummary,
    /// Absent when the owner hides their statistics.
    pub statistics: Option<UserProfile>,
    pub followers: i64,
    pub following: i64,
}

/// Create a user together with their profile.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    authorize(state.api_token.as_deref(), &headers)?;

    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let user = user::create_user(state.db.pool(), &id, &req.username, &req.email).await?;

    info!(user_id = %user.id, username = %user.username, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(State(state): State<AppState>, current: CurrentUser) -> Result<Json<MeResponse>> {
    let pool = state.db.pool();
    let user = user::get_user(pool, current.id()).await?;
    let profile = user_profile::get_profile(pool, current.id()).await?;
    let (followers, following) = follow::follow_counts(pool, current.id()).await?;

    Ok(Json(MeResponse {
        user,
        profile,
        followers,
        following,
    }))
}

/// Change the caller's privacy settings.
pub async fn update_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(settings): Json<ProfileSettings>,
) -> Result<Json<UserProfile>> {
    let profile = user_profile::update_settings(state.db.pool(), current.id(), &settings).await?;
    info!(
        user_id = %current.id(),
        profile_public = profile.profile_public,
        show_statistics = profile.show_statistics,
        "Privacy settings changed"
    );
    Ok(Json(profile))
}

/// Public profiles matching `q` by username or email.
pub async fn search(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(user::search_public_users(state.db.pool(), current.id(), &query.q).await?))
}

/// A user's profile. Private profiles are reported as not found to others.
pub async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PublicProfile>> {
    let pool = state.db.pool();
    let target = user::get_user(pool, &id).await?;
    let profile = user_profile::get_profile(pool, &id).await?;

    let own = id == current.id();
    if !own && !profile.profile_public {
        return Err(DatabaseError::NotFound { entity: "User", id }.into());
    }

    let (followers, following) = follow::follow_counts(pool, &id).await?;
    let statistics = (own || profile.show_statistics).then_some(profile);
    Ok(Json(PublicProfile {
        user: UserSummary {
            id: target.id,
            username: target.username,
            created_at: target.created_at,
        },
        statistics,
        followers,
        following,
    }))
}

pub async fn follow_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(target): Path<String>,
) -> Result<StatusCode> {
    let pool = state.db.pool();
    user::get_user(pool, &target).await?;
    follow::follow(pool, current.id(), &target).await?;

    info!(follower = %current.id(), following = %target, "Followed user");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(target): Path<String>,
) -> Result<StatusCode> {
    follow::unfollow(state.db.pool(), current.id(), &target).await?;
    Ok(StatusCode::NO_CONTENT)
}
