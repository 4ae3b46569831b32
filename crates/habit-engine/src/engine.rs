//! Completion recording: streaks, points, badges and the profile mirror.

use std::sync::Arc;

use chrono::NaiveDate;
use database::validation::validate_note;
use database::{
    badge, entry, habit, points, user_profile, Badge, Database, Habit, HabitEntry, NewLedgerEntry,
    UserProfile,
};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::badges::{self, BadgeProgress};
use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::feed::{FeedEvent, FeedPublisher};
use crate::locks::HabitLocks;
use crate::streak::{compute_streak, StreakState};

/// Points for completing a standard habit.
pub const STANDARD_POINTS: i64 = 10;

/// Points for completing a micro habit.
pub const MICRO_POINTS: i64 = 5;

/// Points granted for one completion of `habit`.
pub fn points_for(habit: &Habit) -> i64 {
    if habit.is_micro {
        MICRO_POINTS
    } else {
        STANDARD_POINTS
    }
}

/// Outcome of [`StreakEngine::record_completion`].
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub entry: HabitEntry,
    pub current_streak: i64,
    pub best_streak: i64,
    /// False when the day was already completed and nothing changed.
    pub newly_completed: bool,
    pub points_awarded: i64,
    pub badges_awarded: Vec<Badge>,
    pub profile: UserProfile,
}

/// Outcome of [`StreakEngine::record_incomplete`].
#[derive(Debug, Clone, Serialize)]
pub struct Incompletion {
    pub entry: HabitEntry,
    pub current_streak: i64,
    pub best_streak: i64,
    pub profile: UserProfile,
}

/// One item of [`StreakEngine::record_bulk`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BulkEntry {
    pub habit_id: i64,
    pub date: NaiveDate,
    #[serde(default = "completed_by_default")]
    pub completed: bool,
    #[serde(default)]
    pub note: String,
}

fn completed_by_default() -> bool {
    true
}

/// Records completions and keeps streaks, the ledger and profiles consistent.
///
/// Every mutation of a habit runs under that habit's lock and inside one
/// SQLite transaction. A conflicting transaction is retried once. Feed events
/// are published after commit and their failures are only logged.
pub struct StreakEngine {
    db: Database,
    clock: Arc<dyn Clock>,
    feed: Arc<dyn FeedPublisher>,
    locks: HabitLocks,
}

impl StreakEngine {
    pub fn new(db: Database, clock: Arc<dyn Clock>, feed: Arc<dyn FeedPublisher>) -> Self {
        Self {
            db,
            clock,
            feed,
            locks: HabitLocks::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Today according to the injected clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Mark `habit_id` completed on `date` (default today).
    ///
    /// Completing a day that is already completed is a no-op and grants nothing.
    /// A day un-completed and then completed again earns its points again.
    pub async fn record_completion(
        &self,
        user_id: &str,
        habit_id: i64,
        date: Option<NaiveDate>,
        note: Option<&str>,
    ) -> Result<Completion> {
        let date = date.unwrap_or_else(|| self.clock.today());
        if let Some(note) = note {
            validate_note(note)?;
        }

        let guard = self.locks.lock(habit_id).await;
        let result = match self.complete_once(user_id, habit_id, date, note).await {
            Err(e) if e.is_conflict() => {
                warn!(habit_id, %date, "Completion conflicted, retrying: {}", e);
                self.complete_once(user_id, habit_id, date, note).await
            }
            other => other,
        };
        drop(guard);

        let (completion, events) = result?;
        self.publish(events).await;
        Ok(completion)
    }

    /// Mark `habit_id` not completed on `date` (default today).
    ///
    /// The streak is recomputed. Points already granted are kept.
    pub async fn record_incomplete(
        &self,
        user_id: &str,
        habit_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Incompletion> {
        let date = date.unwrap_or_else(|| self.clock.today());

        let _guard = self.locks.lock(habit_id).await;
        match self.uncomplete_once(user_id, habit_id, date).await {
            Err(e) if e.is_conflict() => {
                warn!(habit_id, %date, "Incompletion conflicted, retrying: {}", e);
                self.uncomplete_once(user_id, habit_id, date).await
            }
            other => other,
        }
    }

    /// Create every listed entry that does not exist yet.
    ///
    /// Items for habits the caller does not own are skipped. Existing entries
    /// are returned as they are. New entries are recorded like single
    /// completions, so streaks, points and badges follow.
    pub async fn record_bulk(&self, user_id: &str, items: &[BulkEntry]) -> Result<Vec<HabitEntry>> {
        for item in items {
            validate_note(&item.note)?;
        }

        let mut entries = Vec::with_capacity(items.len());
        let mut events = Vec::new();
        for item in items {
            let guard = self.locks.lock(item.habit_id).await;
            let outcome = match self.bulk_once(user_id, item).await {
                Err(e) if e.is_conflict() => {
                    warn!(habit_id = item.habit_id, date = %item.date, "Bulk entry conflicted, retrying: {}", e);
                    self.bulk_once(user_id, item).await
                }
                other => other,
            };
            drop(guard);

            match outcome {
                Ok((entry, item_events)) => {
                    entries.push(entry);
                    events.extend(item_events);
                }
                Err(EngineError::NotFound { entity: "Habit", .. }) => {
                    debug!(user_id, habit_id = item.habit_id, "Skipping habit outside the caller's habits");
                }
                Err(e) => {
                    self.publish(events).await;
                    return Err(e);
                }
            }
        }

        info!(user_id, requested = items.len(), recorded = entries.len(), "Bulk entries recorded");
        self.publish(events).await;
        Ok(entries)
    }

    /// Delete a habit with its entries and refresh the owner's profile.
    ///
    /// Ledger rows survive with their habit reference cleared.
    pub async fn delete_habit(&self, user_id: &str, habit_id: i64) -> Result<UserProfile> {
        let _guard = self.locks.lock(habit_id).await;

        let mut tx = self.db.begin_write().await?;
        let outcome = delete_in(&mut tx, user_id, habit_id).await;
        let profile = tx.finish(outcome).await?;

        info!(user_id, habit_id, "Habit deleted");
        Ok(profile)
    }

    async fn complete_once(
        &self,
        user_id: &str,
        habit_id: i64,
        date: NaiveDate,
        note: Option<&str>,
    ) -> Result<(Completion, Vec<FeedEvent>)> {
        let mut tx = self.db.begin_write().await?;
        let outcome = complete_in(&mut tx, user_id, habit_id, date, note).await;
        tx.finish(outcome).await
    }

    async fn uncomplete_once(&self, user_id: &str, habit_id: i64, date: NaiveDate) -> Result<Incompletion> {
        let mut tx = self.db.begin_write().await?;
        let outcome = uncomplete_in(&mut tx, user_id, habit_id, date).await;
        tx.finish(outcome).await
    }

    async fn bulk_once(&self, user_id: &str, item: &BulkEntry) -> Result<(HabitEntry, Vec<FeedEvent>)> {
        let mut tx = self.db.begin_write().await?;
        let outcome = bulk_in(&mut tx, user_id, item).await;
        tx.finish(outcome).await
    }

    async fn publish(&self, events: Vec<FeedEvent>) {
        for event in events {
            if let Err(e) = self.feed.publish(event).await {
                warn!("Failed to publish feed event: {}", e);
            }
        }
    }
}

async fn complete_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    habit_id: i64,
    date: NaiveDate,
    note: Option<&str>,
) -> Result<(Completion, Vec<FeedEvent>)> {
    let habit = habit::get_owned_habit(&mut *conn, habit_id, user_id).await?;

    let mut entry = match entry::get_entry(&mut *conn, habit_id, date).await? {
        Some(existing) if existing.completed => {
            debug!(habit_id, %date, "Already completed");
            let profile = user_profile::get_profile(&mut *conn, user_id).await?;
            let completion = Completion {
                entry: existing,
                current_streak: habit.current_streak,
                best_streak: habit.best_streak,
                newly_completed: false,
                points_awarded: 0,
                badges_awarded: Vec::new(),
                profile,
            };
            return Ok((completion, Vec::new()));
        }
        Some(existing) => entry::set_completed(&mut *conn, existing.id, true, note).await?,
        None => entry::insert_entry(&mut *conn, habit_id, date, true, note.unwrap_or_default()).await?,
    };

    let (streak, best_streak) = recompute_streak(&mut *conn, &habit).await?;

    let amount = points_for(&habit);
    points::append(
        &mut *conn,
        &NewLedgerEntry {
            user_id,
            amount,
            reason: format!("Completed habit: {}", habit.title),
            habit_id: Some(habit.id),
            entry_id: Some(entry.id),
        },
    )
    .await?;
    entry::set_points_earned(&mut *conn, entry.id, amount).await?;
    entry.points_earned = amount;

    let badges_awarded = award_badges(&mut *conn, user_id, streak.current).await?;
    let profile = user_profile::refresh_profile(&mut *conn, user_id).await?;

    info!(
        user_id,
        habit_id,
        %date,
        streak = streak.current,
        points = amount,
        badges = badges_awarded.len(),
        "Habit completed"
    );

    let mut events = vec![FeedEvent::HabitCompleted {
        user_id: user_id.to_string(),
        habit_id,
        habit_title: habit.title.clone(),
        entry_id: entry.id,
    }];
    events.extend(badges_awarded.iter().map(|badge| FeedEvent::BadgeEarned {
        user_id: user_id.to_string(),
        badge_code: badge.code.clone(),
        badge_name: badge.name.clone(),
    }));

    let completion = Completion {
        entry,
        current_streak: streak.current,
        best_streak,
        newly_completed: true,
        points_awarded: amount,
        badges_awarded,
        profile,
    };
    Ok((completion, events))
}

async fn uncomplete_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    habit_id: i64,
    date: NaiveDate,
) -> Result<Incompletion> {
    let habit = habit::get_owned_habit(&mut *conn, habit_id, user_id).await?;

    let entry = match entry::get_entry(&mut *conn, habit_id, date).await? {
        Some(existing) if !existing.completed => existing,
        Some(existing) => entry::set_completed(&mut *conn, existing.id, false, None).await?,
        None => entry::insert_entry(&mut *conn, habit_id, date, false, "").await?,
    };

    let (streak, best_streak) = recompute_streak(&mut *conn, &habit).await?;
    let profile = user_profile::refresh_profile(&mut *conn, user_id).await?;

    info!(user_id, habit_id, %date, streak = streak.current, "Habit marked incomplete");

    Ok(Incompletion {
        entry,
        current_streak: streak.current,
        best_streak,
        profile,
    })
}

async fn bulk_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    item: &BulkEntry,
) -> Result<(HabitEntry, Vec<FeedEvent>)> {
    habit::get_owned_habit(&mut *conn, item.habit_id, user_id).await?;
    if let Some(existing) = entry::get_entry(&mut *conn, item.habit_id, item.date).await? {
        return Ok((existing, Vec::new()));
    }

    if item.completed {
        let note = Some(item.note.as_str());
        let (completion, events) = complete_in(conn, user_id, item.habit_id, item.date, note).await?;
        Ok((completion.entry, events))
    } else {
        let incompletion = uncomplete_in(conn, user_id, item.habit_id, item.date).await?;
        Ok((incompletion.entry, Vec::new()))
    }
}

async fn delete_in(conn: &mut SqliteConnection, user_id: &str, habit_id: i64) -> Result<UserProfile> {
    habit::delete_habit(&mut *conn, habit_id, user_id).await?;
    Ok(user_profile::refresh_profile(&mut *conn, user_id).await?)
}

/// Rescan the habit's completed dates and persist the streak fields.
async fn recompute_streak(conn: &mut SqliteConnection, habit: &Habit) -> Result<(StreakState, i64)> {
    let dates = entry::completed_dates_desc(&mut *conn, habit.id).await?;
    let streak = compute_streak(&dates);
    let best_streak = habit.best_streak.max(streak.current);

    habit::update_streak(&mut *conn, habit.id, streak.current, best_streak, streak.last_completed).await?;
    Ok((streak, best_streak))
}

/// Award every newly earned badge and grant its points.
async fn award_badges(conn: &mut SqliteConnection, user_id: &str, current_streak: i64) -> Result<Vec<Badge>> {
    let progress = BadgeProgress {
        habit_count: habit::count_habits(&mut *conn, user_id).await?,
        current_streak,
        total_completions: entry::user_counts(&mut *conn, user_id, None).await?.completed,
        micro_completions: entry::count_completed_micro(&mut *conn, user_id).await?,
    };

    let mut awarded = Vec::new();
    for code in badges::earned(&progress) {
        if !badge::award_badge(&mut *conn, user_id, code.as_str()).await? {
            continue;
        }

        let definition = badge::get_badge(&mut *conn, code.as_str()).await?;
        points::append(
            &mut *conn,
            &NewLedgerEntry {
                user_id,
                amount: definition.points,
                reason: format!("Badge earned: {}", definition.name),
                habit_id: None,
                entry_id: None,
            },
        )
        .await?;

        info!(user_id, badge = %definition.code, "Badge awarded");
        awarded.push(definition);
    }

    Ok(awarded)
}
