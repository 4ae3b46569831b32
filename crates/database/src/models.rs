//! Database models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// UUID string supplied by the identity layer.
    pub id: String,
    /// Unique handle.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Registration timestamp.
    pub created_at: String,
}

/// Gamification counters for a user, materialized from the ledger, entries and habits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    /// Sum of the user's ledger rows.
    pub total_points: i64,
    /// Completed entries across all habits.
    pub total_completions: i64,
    /// Highest `current_streak` across the user's habits.
    pub current_streak: i64,
    /// Highest `best_streak` across the user's habits.
    pub best_streak: i64,
    /// `max(1, total_points / 100 + 1)`.
    pub level: i64,
    /// Listed in user search and viewable by other users.
    pub profile_public: bool,
    /// Whether other users see the counters above.
    pub show_statistics: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Privacy settings change; `None` keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub profile_public: Option<bool>,
    pub show_statistics: Option<bool>,
}

/// What other users see of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

/// Habit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum HabitCategory {
    Health,
    Productivity,
    Learning,
    Fitness,
    Mindfulness,
    Social,
    #[default]
    Other,
}

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum HabitFrequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

/// A tracked habit owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Habit {
    pub id: i64,
    pub user_id: String,
    /// Unique per owner.
    pub title: String,
    pub description: String,
    pub category: HabitCategory,
    pub frequency: HabitFrequency,
    pub is_active: bool,
    /// Micro habits earn reduced points.
    pub is_micro: bool,
    pub current_streak: i64,
    pub best_streak: i64,
    /// Date of the most recent completed entry.
    pub last_completed: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewHabit {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: HabitCategory,
    #[serde(default)]
    pub frequency: HabitFrequency,
    #[serde(default)]
    pub is_micro: bool,
}

impl NewHabit {
    /// A daily habit in the default category with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a habit; `None` leaves the column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HabitUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<HabitCategory>,
    pub frequency: Option<HabitFrequency>,
    pub is_active: Option<bool>,
    pub is_micro: Option<bool>,
}

/// One day of a habit. At most one per (habit, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HabitEntry {
    pub id: i64,
    pub habit_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    pub note: String,
    /// Points granted when this entry first became completed.
    pub points_earned: i64,
    pub completed_at: String,
}

/// "After the anchor habit, I will do the habit".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HabitStack {
    pub id: i64,
    pub user_id: String,
    pub habit_id: i64,
    pub habit_title: String,
    pub anchor_habit_id: i64,
    pub anchor_habit_title: String,
    /// Order among the habits stacked on the same anchor.
    pub position: i64,
    pub created_at: String,
}

/// Fields for stacking a habit onto an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabitStack {
    pub habit_id: i64,
    pub anchor_habit_id: i64,
    #[serde(default)]
    pub position: i64,
}

/// An accountability agreement between a habit's owner and a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HabitContract {
    pub id: i64,
    pub creator_id: String,
    pub partner_id: String,
    pub partner_username: String,
    pub habit_id: i64,
    pub habit_title: String,
    pub terms: String,
    pub active: bool,
    pub created_at: String,
}

/// Fields for a new contract; the creator is the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabitContract {
    pub partner_id: String,
    pub habit_id: i64,
    pub terms: String,
}

/// An achievement definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Badge {
    /// Stable identifier such as `STREAK_7`.
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Points granted on award.
    pub points: i64,
}

/// A badge earned by a user, joined with its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AwardedBadge {
    pub id: i64,
    pub user_id: String,
    pub badge_code: String,
    pub name: String,
    pub icon: String,
    pub points: i64,
    pub awarded_at: String,
}

/// An immutable points grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub amount: i64,
    pub reason: String,
    pub habit_id: Option<i64>,
    pub entry_id: Option<i64>,
    pub created_at: String,
}

/// A points grant to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry<'a> {
    pub user_id: &'a str,
    pub amount: i64,
    pub reason: String,
    pub habit_id: Option<i64>,
    pub entry_id: Option<i64>,
}

/// What a feed item announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FeedKind {
    Completion,
    Badge,
    Challenge,
}

/// A social feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FeedItem {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub kind: FeedKind,
    pub message: String,
    pub habit_id: Option<i64>,
    pub badge_code: Option<String>,
    pub challenge_id: Option<i64>,
    pub entry_id: Option<i64>,
    pub comment_count: i64,
    pub reaction_count: i64,
    pub created_at: String,
}

/// A comment on a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: String,
    pub feed_item_id: i64,
    pub text: String,
    pub created_at: String,
}

/// An emoji reaction on a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reaction {
    pub id: i64,
    pub user_id: String,
    pub feed_item_id: i64,
    pub emoji: String,
    pub created_at: String,
}

/// A community challenge with its participant count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Challenge {
    pub id: i64,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Target completions or points.
    pub goal: i64,
    pub participants_count: i64,
    pub created_at: String,
}
