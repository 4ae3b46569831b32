//! Habit CRUD, completions and per-habit reporting.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use database::habit::{self, HabitFilter};
use database::validation::validate_date_range;
use database::{entry, Habit, HabitCategory, HabitEntry, HabitUpdate, NewHabit};
use habit_engine::{BulkEntry, Completion, HabitAnalytics, Incompletion, TodayHabit};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Filters for listing habits.
#[derive(Debug, Default, Deserialize)]
pub struct HabitsQuery {
    pub category: Option<HabitCategory>,
    pub is_active: Option<bool>,
}

/// Body of a completion request. Both fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteRequest {
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncompleteRequest {
    pub date: Option<NaiveDate>,
}

/// Inclusive date range for entries.
#[derive(Debug, Default, Deserialize)]
pub struct EntriesQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Entries to create in one request.
#[derive(Debug, Default, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub entries: Vec<BulkEntry>,
}

#[derive(Debug, Serialize)]
pub struct NeverMissTwice {
    pub habit_id: i64,
    /// False when the two most recent misses are on consecutive days.
    pub on_track: bool,
}

/// Use the JSON body if one was sent, the defaults if none was.
fn optional_body<T: Default>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

pub async fn list_habits(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<HabitsQuery>,
) -> Result<Json<Vec<Habit>>> {
    let filter = HabitFilter {
        category: query.category,
        is_active: query.is_active,
    };
    let habits = habit::list_habits(state.db.pool(), current.id(), filter).await?;
    Ok(Json(habits))
}

pub async fn create_habit(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(new): Json<NewHabit>,
) -> Result<(StatusCode, Json<Habit>)> {
    let habit = habit::create_habit(state.db.pool(), current.id(), &new).await?;
    info!(user_id = %current.id(), habit_id = habit.id, "Habit created");
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn get_habit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Habit>> {
    let habit = habit::get_owned_habit(state.db.pool(), id, current.id()).await?;
    Ok(Json(habit))
}

pub async fn update_habit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<HabitUpdate>,
) -> Result<Json<Habit>> {
    let habit = habit::update_habit(state.db.pool(), id, current.id(), &update).await?;
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.engine.delete_habit(current.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a habit completed for a day (default today).
pub async fn complete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    body: std::result::Result<Json<CompleteRequest>, JsonRejection>,
) -> Result<Json<Completion>> {
    let req = optional_body(body)?;
    let completion = state
        .engine
        .record_completion(current.id(), id, req.date, req.note.as_deref())
        .await?;
    Ok(Json(completion))
}

/// Mark a habit not completed for a day (default today).
pub async fn incomplete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    body: std::result::Result<Json<IncompleteRequest>, JsonRejection>,
) -> Result<Json<Incompletion>> {
    let req = optional_body(body)?;
    let incompletion = state.engine.record_incomplete(current.id(), id, req.date).await?;
    Ok(Json(incompletion))
}

pub async fn entries(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<HabitEntry>>> {
    if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
        validate_date_range(from, to).map_err(database::DatabaseError::from)?;
    }

    let pool = state.db.pool();
    habit::get_owned_habit(pool, id, current.id()).await?;
    let entries = entry::list_entries(pool, id, query.date_from, query.date_to).await?;
    Ok(Json(entries))
}

/// Create entries for several habits and days. Other users' habits are skipped.
pub async fn bulk_entries(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<BulkRequest>,
) -> Result<(StatusCode, Json<Vec<HabitEntry>>)> {
    let entries = state.engine.record_bulk(current.id(), &req.entries).await?;
    Ok((StatusCode::CREATED, Json(entries)))
}

pub async fn analytics(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<HabitAnalytics>> {
    Ok(Json(state.reporter.habit_analytics(current.id(), id).await?))
}

pub async fn never_miss_twice(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<NeverMissTwice>> {
    let on_track = state.reporter.never_miss_twice(current.id(), id).await?;
    Ok(Json(NeverMissTwice { habit_id: id, on_track }))
}

/// Active habits with today's completion flag.
pub async fn today(State(state): State<AppState>, current: CurrentUser) -> Result<Json<Vec<TodayHabit>>> {
    Ok(Json(state.reporter.today(current.id()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{self, alice, bob};

    async fn create(state: &AppState, title: &str) -> Habit {
        let (_, Json(habit)) = create_habit(State(state.clone()), alice(), Json(NewHabit::titled(title)))
            .await
            .unwrap();
        habit
    }

    fn on(date: NaiveDate) -> std::result::Result<Json<CompleteRequest>, JsonRejection> {
        Ok(Json(CompleteRequest {
            date: Some(date),
            note: None,
        }))
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let state = test_support::state().await;
        create(&state, "Run").await;
        create(&state, "Read").await;

        let Json(habits) = list_habits(State(state.clone()), alice(), Query(HabitsQuery::default()))
            .await
            .unwrap();
        assert_eq!(habits.len(), 2);

        let Json(theirs) = list_habits(State(state.clone()), bob(), Query(HabitsQuery::default()))
            .await
            .unwrap();
        assert!(theirs.is_empty());

        let duplicate = create_habit(State(state), alice(), Json(NewHabit::titled("Run")))
            .await
            .unwrap_err();
        assert_eq!(duplicate.status().0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_complete_defaults_to_today() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;

        let Json(completion) = complete(
            State(state.clone()),
            alice(),
            Path(run.id),
            Ok(Json(CompleteRequest::default())),
        )
        .await
        .unwrap();
        assert_eq!(completion.entry.date, test_support::today());
        assert_eq!(completion.current_streak, 1);

        let Json(today_view) = today(State(state), alice()).await.unwrap();
        assert!(today_view[0].completed_today);
    }

    #[tokio::test]
    async fn test_other_users_habit_is_hidden() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;

        let err = get_habit(State(state.clone()), bob(), Path(run.id)).await.unwrap_err();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);

        let err = complete(State(state.clone()), bob(), Path(run.id), on(test_support::today()))
            .await
            .unwrap_err();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);

        let err = delete_habit(State(state), bob(), Path(run.id)).await.unwrap_err();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_entries_range_and_incomplete() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();

        for d in [10, 11, 12] {
            complete(State(state.clone()), alice(), Path(run.id), on(day(d))).await.unwrap();
        }
        let Json(undone) = incomplete(
            State(state.clone()),
            alice(),
            Path(run.id),
            Ok(Json(IncompleteRequest { date: Some(day(11)) })),
        )
        .await
        .unwrap();
        assert_eq!(undone.current_streak, 1);
        assert_eq!(undone.best_streak, 3);

        let Json(listed) = entries(
            State(state.clone()),
            alice(),
            Path(run.id),
            Query(EntriesQuery {
                date_from: Some(day(11)),
                date_to: Some(day(12)),
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, day(12));

        let err = entries(
            State(state),
            alice(),
            Path(run.id),
            Query(EntriesQuery {
                date_from: Some(day(12)),
                date_to: Some(day(11)),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status().0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;

        let Json(updated) = update_habit(
            State(state.clone()),
            alice(),
            Path(run.id),
            Json(HabitUpdate {
                is_active: Some(false),
                ..HabitUpdate::default()
            }),
        )
        .await
        .unwrap();
        assert!(!updated.is_active);

        let Json(today_view) = today(State(state.clone()), alice()).await.unwrap();
        assert!(today_view.is_empty());

        let status = delete_habit(State(state.clone()), alice(), Path(run.id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_habit(State(state), alice(), Path(run.id)).await.unwrap_err();
        assert_eq!(err.status().0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_and_never_miss_twice() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;

        let Json(fresh) = analytics(State(state.clone()), alice(), Path(run.id)).await.unwrap();
        assert_eq!(fresh.completion_rate, 0.0);

        let Json(check) = never_miss_twice(State(state), alice(), Path(run.id)).await.unwrap();
        assert!(check.on_track);
    }

    #[tokio::test]
    async fn test_bulk_entries_skip_other_users_habits() {
        let state = test_support::state().await;
        let run = create(&state, "Run").await;
        let swim = habit::create_habit(state.db.pool(), "u-2", &NewHabit::titled("Swim"))
            .await
            .unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        let item = |habit_id, date| BulkEntry {
            habit_id,
            date,
            completed: true,
            note: String::new(),
        };
        let req = BulkRequest {
            entries: vec![item(run.id, day(29)), item(run.id, day(30)), item(swim.id, day(30))],
        };

        let (status, Json(created)) = bulk_entries(State(state.clone()), alice(), Json(req)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.len(), 2);
        assert!(created.iter().all(|e| e.habit_id == run.id && e.completed));

        let Json(habit) = get_habit(State(state.clone()), alice(), Path(run.id)).await.unwrap();
        assert_eq!(habit.current_streak, 2);

        let untouched = entry::list_entries(state.db.pool(), swim.id, None, None).await.unwrap();
        assert!(untouched.is_empty());

        let empty = BulkRequest::default();
        let (_, Json(none)) = bulk_entries(State(state), bob(), Json(empty)).await.unwrap();
        assert!(none.is_empty());
    }
}
