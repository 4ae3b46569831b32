//! Read-only rollups over habits, entries and profiles.
//!
//! The only write here is [`Reporter::level_progress`] correcting a stored
//! level that no longer matches the user's points.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use database::habit::HabitFilter;
use database::report::{leaderboard_rows, LeaderboardRow};
use database::{entry, habit, user, user_profile, Database, HabitCategory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::Result;
use crate::level::LevelProgress;
use crate::streak;

/// Number of users shown on the leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;

/// Aggregate statistics for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStatistics {
    pub total_habits: i64,
    pub active_habits: i64,
    pub total_completions: i64,
    /// Percentage of entries that are completed; 0 with no entries.
    pub completion_rate: f64,
    /// Mean `current_streak` across habits; 0 with no habits.
    pub average_streak: f64,
    pub this_week_completions: i64,
    pub this_month_completions: i64,
    pub current_streak: i64,
    pub best_streak: i64,
    pub total_points: i64,
}

/// Completions on one day of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCompletions {
    pub date: NaiveDate,
    /// Abbreviated weekday, e.g. `Mon`.
    pub day_name: String,
    pub completions: i64,
}

/// Leaderboard period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardWindow {
    #[default]
    Weekly,
    Monthly,
}

impl LeaderboardWindow {
    /// Days before today where the window starts.
    pub fn days(&self) -> u64 {
        match self {
            LeaderboardWindow::Weekly => 7,
            LeaderboardWindow::Monthly => 30,
        }
    }
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based.
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub window_completions: i64,
    pub current_streak: i64,
    pub total_points: i64,
}

/// Site-wide activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommunityStats {
    pub total_users: i64,
    pub total_habits: i64,
    pub completions_today: i64,
    pub active_today: i64,
}

/// Completion figures for one habit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitAnalytics {
    pub habit_id: i64,
    pub title: String,
    pub completion_rate: f64,
    pub current_streak: i64,
    pub best_streak: i64,
    pub total_completions: i64,
    pub total_entries: i64,
    pub week_completions: i64,
    pub month_completions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStreak {
    pub id: i64,
    pub title: String,
    pub current_streak: i64,
    pub best_streak: i64,
    pub last_completed: Option<NaiveDate>,
}

/// Streaks of every habit a user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_total: i64,
    pub best_total: i64,
    pub habits: Vec<HabitStreak>,
}

/// An active habit with today's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayHabit {
    pub id: i64,
    pub title: String,
    pub category: HabitCategory,
    pub is_micro: bool,
    pub current_streak: i64,
    pub completed_today: bool,
}

/// `completed / total * 100`, or 0 when there is nothing to divide by.
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

/// Rank rows by window completions, then streak, then points, and keep the top entries.
pub fn rank_leaderboard(mut rows: Vec<LeaderboardRow>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|a, b| {
        (b.window_completions, b.current_streak, b.total_points)
            .cmp(&(a.window_completions, a.current_streak, a.total_points))
            .then_with(|| a.username.cmp(&b.username))
    });

    rows.into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i + 1,
            user_id: row.user_id,
            username: row.username,
            window_completions: row.window_completions,
            current_streak: row.current_streak,
            total_points: row.total_points,
        })
        .collect()
}

/// Zero-filled series of `len` days ending at `today`, oldest first.
fn fill_series(today: NaiveDate, len: u64, counts: &[(NaiveDate, i64)]) -> Vec<DailyCompletions> {
    let by_date: HashMap<NaiveDate, i64> = counts.iter().copied().collect();
    let start = days_before(today, len.saturating_sub(1));

    start
        .iter_days()
        .take(len as usize)
        .map(|date| DailyCompletions {
            date,
            day_name: date.format("%a").to_string(),
            completions: by_date.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Reporting queries.
pub struct Reporter {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl Reporter {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn user_statistics(&self, user_id: &str) -> Result<UserStatistics> {
        let pool = self.db.pool();
        let today = self.clock.today();

        let habits = habit::list_habits(pool, user_id, HabitFilter::default()).await?;
        let all = entry::user_counts(pool, user_id, None).await?;
        let week = entry::user_counts(pool, user_id, Some(days_before(today, 7))).await?;
        let month = entry::user_counts(pool, user_id, Some(days_before(today, 30))).await?;
        let profile = user_profile::get_profile(pool, user_id).await?;

        let total_habits = habits.len() as i64;
        let average_streak = if habits.is_empty() {
            0.0
        } else {
            habits.iter().map(|h| h.current_streak).sum::<i64>() as f64 / habits.len() as f64
        };

        Ok(UserStatistics {
            total_habits,
            active_habits: habits.iter().filter(|h| h.is_active).count() as i64,
            total_completions: all.completed,
            completion_rate: completion_rate(all.completed, all.total),
            average_streak,
            this_week_completions: week.completed,
            this_month_completions: month.completed,
            current_streak: habits.iter().map(|h| h.current_streak).max().unwrap_or(0),
            best_streak: habits.iter().map(|h| h.best_streak).max().unwrap_or(0),
            total_points: profile.total_points,
        })
    }

    /// The last 7 days including today.
    pub async fn weekly_series(&self, user_id: &str) -> Result<Vec<DailyCompletions>> {
        self.series(user_id, 7).await
    }

    /// The last 30 days including today.
    pub async fn monthly_series(&self, user_id: &str) -> Result<Vec<DailyCompletions>> {
        self.series(user_id, 30).await
    }

    async fn series(&self, user_id: &str, len: u64) -> Result<Vec<DailyCompletions>> {
        let today = self.clock.today();
        let from = days_before(today, len - 1);
        let counts = entry::daily_completions(self.db.pool(), user_id, from, today).await?;
        Ok(fill_series(today, len, &counts))
    }

    pub async fn leaderboard(&self, window: LeaderboardWindow) -> Result<Vec<LeaderboardEntry>> {
        let since = days_before(self.clock.today(), window.days());
        let rows = leaderboard_rows(self.db.pool(), since).await?;
        debug!(?window, users = rows.len(), "Ranking leaderboard");
        Ok(rank_leaderboard(rows))
    }

    pub async fn community_stats(&self) -> Result<CommunityStats> {
        let pool = self.db.pool();
        let (completions_today, active_today) = entry::completions_on(pool, self.clock.today()).await?;

        Ok(CommunityStats {
            total_users: user::count_users(pool).await?,
            total_habits: habit::count_active_habits(pool).await?,
            completions_today,
            active_today,
        })
    }

    /// Level standing derived from points. A stale stored level is rewritten.
    pub async fn level_progress(&self, user_id: &str) -> Result<LevelProgress> {
        let profile = user_profile::get_profile(self.db.pool(), user_id).await?;
        let progress = LevelProgress::from_points(profile.total_points);

        if profile.level != progress.level {
            user_profile::set_level(self.db.pool(), user_id, progress.level).await?;
            info!(user_id, from = profile.level, to = progress.level, "Corrected stored level");
        }

        Ok(progress)
    }

    pub async fn habit_analytics(&self, user_id: &str, habit_id: i64) -> Result<HabitAnalytics> {
        let pool = self.db.pool();
        let today = self.clock.today();
        let habit = habit::get_owned_habit(pool, habit_id, user_id).await?;

        let all = entry::habit_counts(pool, habit_id, None).await?;
        let week = entry::habit_counts(pool, habit_id, Some(days_before(today, 7))).await?;
        let month = entry::habit_counts(pool, habit_id, Some(days_before(today, 30))).await?;

        Ok(HabitAnalytics {
            habit_id,
            title: habit.title,
            completion_rate: completion_rate(all.completed, all.total),
            current_streak: habit.current_streak,
            best_streak: habit.best_streak,
            total_completions: all.completed,
            total_entries: all.total,
            week_completions: week.completed,
            month_completions: month.completed,
        })
    }

    pub async fn streak_summary(&self, user_id: &str) -> Result<StreakSummary> {
        let habits = habit::list_habits(self.db.pool(), user_id, HabitFilter::default()).await?;

        Ok(StreakSummary {
            current_total: habits.iter().map(|h| h.current_streak).sum(),
            best_total: habits.iter().map(|h| h.best_streak).sum(),
            habits: habits
                .into_iter()
                .map(|h| HabitStreak {
                    id: h.id,
                    title: h.title,
                    current_streak: h.current_streak,
                    best_streak: h.best_streak,
                    last_completed: h.last_completed,
                })
                .collect(),
        })
    }

    /// Active habits with whether each is completed today.
    pub async fn today(&self, user_id: &str) -> Result<Vec<TodayHabit>> {
        let pool = self.db.pool();
        let today = self.clock.today();
        let filter = HabitFilter {
            is_active: Some(true),
            ..HabitFilter::default()
        };

        let mut result = Vec::new();
        for h in habit::list_habits(pool, user_id, filter).await? {
            let completed_today = entry::get_entry(pool, h.id, today)
                .await?
                .is_some_and(|e| e.completed);
            result.push(TodayHabit {
                id: h.id,
                title: h.title,
                category: h.category,
                is_micro: h.is_micro,
                current_streak: h.current_streak,
                completed_today,
            });
        }

        Ok(result)
    }

    /// False when the habit's two most recent misses are on consecutive days.
    pub async fn never_miss_twice(&self, user_id: &str, habit_id: i64) -> Result<bool> {
        let pool = self.db.pool();
        habit::get_owned_habit(pool, habit_id, user_id).await?;
        let missed = entry::missed_dates_desc(pool, habit_id, 2).await?;
        Ok(streak::never_miss_twice(&missed))
    }
}
