//! Route handlers for the habit API.

pub mod badges;
pub mod challenges;
pub mod contracts;
pub mod habits;
pub mod health;
pub mod social;
pub mod stacks;
pub mod stats;
pub mod users;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Users
        .route("/api/users", post(users::register))
        .route("/api/me", get(users::me))
        .route("/api/me/settings", patch(users::update_settings))
        .route("/api/users/search", get(users::search))
        .route("/api/users/:id", get(users::profile))
        .route(
            "/api/users/:id/follow",
            post(users::follow_user).delete(users::unfollow_user),
        )
        // Habits and completions
        .route("/api/habits", get(habits::list_habits).post(habits::create_habit))
        .route("/api/habits/today", get(habits::today))
        .route(
            "/api/habits/:id",
            get(habits::get_habit)
                .patch(habits::update_habit)
                .delete(habits::delete_habit),
        )
        .route("/api/habits/:id/complete", post(habits::complete))
        .route("/api/habits/:id/incomplete", post(habits::incomplete))
        .route("/api/habits/:id/entries", get(habits::entries))
        .route("/api/habits/:id/analytics", get(habits::analytics))
        .route("/api/habits/:id/never-miss-twice", get(habits::never_miss_twice))
        .route("/api/entries/bulk", post(habits::bulk_entries))
        // Stacks and accountability
        .route("/api/stacks", get(stacks::list_stacks).post(stacks::create_stack))
        .route(
            "/api/stacks/:id",
            patch(stacks::move_stack).delete(stacks::delete_stack),
        )
        .route(
            "/api/contracts",
            get(contracts::list_contracts).post(contracts::create_contract),
        )
        .route("/api/contracts/:id", patch(contracts::set_status))
        // Reporting
        .route("/api/stats", get(stats::statistics))
        .route("/api/stats/weekly", get(stats::weekly))
        .route("/api/stats/monthly", get(stats::monthly))
        .route("/api/stats/streaks", get(stats::streaks))
        .route("/api/leaderboard", get(stats::leaderboard))
        .route("/api/community", get(stats::community))
        .route("/api/level", get(stats::level))
        .route("/api/points", get(stats::points))
        // Badges
        .route("/api/badges", get(badges::catalogue))
        .route("/api/badges/mine", get(badges::mine))
        // Social
        .route("/api/feed", get(social::feed))
        .route(
            "/api/feed/:id/comments",
            get(social::list_comments).post(social::add_comment),
        )
        .route(
            "/api/feed/:id/reactions",
            post(social::add_reaction).delete(social::remove_reaction),
        )
        // Challenges
        .route(
            "/api/challenges",
            get(challenges::list_challenges).post(challenges::create_challenge),
        )
        .route("/api/challenges/:id/join", post(challenges::join_challenge))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use database::{user, Database};
    use habit_engine::FixedClock;

    use crate::auth::CurrentUser;
    use crate::state::AppState;

    /// Today for every handler test.
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    /// State over a fresh database with users `u-1` (alice) and `u-2` (bob).
    pub async fn state() -> AppState {
        let db = Database::in_memory().await.unwrap();
        user::create_user(db.pool(), "u-1", "alice", "alice@example.com").await.unwrap();
        user::create_user(db.pool(), "u-2", "bob", "bob@example.com").await.unwrap();
        AppState::new(db, Arc::new(FixedClock::new(today())), None)
    }

    pub fn alice() -> CurrentUser {
        CurrentUser("u-1".to_string())
    }

    pub fn bob() -> CurrentUser {
        CurrentUser("u-2".to_string())
    }
}
