//! Streak, points, badge and reporting logic for the habit tracker.
//!
//! [`StreakEngine`] records completions. Each mutation of a habit runs under
//! a per-habit lock and inside one SQLite transaction so the streak
//! recompute, the ledger grant, badge awards and the profile refresh commit
//! together. [`Reporter`] answers read-only rollups.
//!
//! Both take an injected [`Clock`]; the engine also takes a
//! [`FeedPublisher`] that receives events after commit.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::{habit, user, Database, NewHabit};
//! use habit_engine::{DatabaseFeed, Reporter, StreakEngine, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:habits.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let clock = Arc::new(SystemClock);
//!     let engine = StreakEngine::new(db.clone(), clock.clone(), Arc::new(DatabaseFeed::new(db.clone())));
//!     let reporter = Reporter::new(db.clone(), clock);
//!
//!     let alice = user::create_user(db.pool(), "0f6d6c1e-8f0b-4a53-9d51-5b8e4c1b2a77", "alice", "alice@example.com").await?;
//!     let read = habit::create_habit(db.pool(), &alice.id, &NewHabit::titled("Read")).await?;
//!
//!     let completion = engine.record_completion(&alice.id, read.id, None, None).await?;
//!     println!("streak: {}", completion.current_streak);
//!
//!     let stats = reporter.user_statistics(&alice.id).await?;
//!     println!("completion rate: {:.1}%", stats.completion_rate);
//!     Ok(())
//! }
//! ```

pub mod badges;
pub mod clock;
pub mod engine;
pub mod error;
pub mod feed;
pub mod level;
pub mod locks;
pub mod reporting;
pub mod streak;

pub use badges::{BadgeCode, BadgeProgress};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{BulkEntry, Completion, Incompletion, StreakEngine, MICRO_POINTS, STANDARD_POINTS};
pub use error::{EngineError, Result};
pub use feed::{DatabaseFeed, FeedEvent, FeedPublisher, LoggingFeed, NoOpFeed};
pub use level::LevelProgress;
pub use locks::HabitLocks;
pub use reporting::{
    CommunityStats, DailyCompletions, HabitAnalytics, HabitStreak, LeaderboardEntry,
    LeaderboardWindow, Reporter, StreakSummary, TodayHabit, UserStatistics,
};
pub use streak::{compute_streak, StreakState};
