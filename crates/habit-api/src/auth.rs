//! Caller identity.
//!
//! Authentication happens upstream. The caller's user ID arrives in the
//! `X-User-Id` header; when an API token is configured the request must also
//! carry it as a bearer token.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use database::user;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authorize(state.api_token.as_deref(), &parts.headers)?;

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::MissingUser)?;

        let user = user::get_user(state.db.pool(), user_id).await?;
        Ok(CurrentUser(user.id))
    }
}

/// Check the bearer token when one is configured.
pub fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue, Request};
    use database::Database;
    use habit_engine::SystemClock;
    use std::sync::Arc;

    #[test]
    fn test_authorize_without_token() {
        assert!(authorize(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_authorize_with_token() {
        let mut headers = HeaderMap::new();
        assert!(matches!(authorize(Some("s3cret"), &headers), Err(ApiError::Unauthorized)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert!(authorize(Some("s3cret"), &headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize(Some("s3cret"), &headers).is_ok());
    }

    async fn extract(state: &AppState, user_id: Option<&str>) -> Result<CurrentUser, ApiError> {
        let mut builder = Request::builder().uri("/api/me");
        if let Some(id) = user_id {
            builder = builder.header(USER_ID_HEADER, id);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, state).await
    }

    #[tokio::test]
    async fn test_current_user_extraction() {
        let db = Database::in_memory().await.unwrap();
        user::create_user(db.pool(), "u-1", "alice", "alice@example.com").await.unwrap();
        let state = AppState::new(db, Arc::new(SystemClock), None);

        assert_eq!(extract(&state, Some("u-1")).await.unwrap(), CurrentUser("u-1".to_string()));
        assert!(matches!(extract(&state, None).await, Err(ApiError::MissingUser)));

        let unknown = extract(&state, Some("u-9")).await.unwrap_err();
        assert_eq!(unknown.status().0, axum::http::StatusCode::NOT_FOUND);
    }
}
