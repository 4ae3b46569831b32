//! SQLite persistence layer for the habit tracker.
//!
//! This crate provides async database operations for users, habits, daily
//! entries, the points ledger, badges and the social tables using SQLx with
//! SQLite. Uniqueness invariants (one entry per habit and day, one award per
//! user and badge, one profile per user) are enforced by the schema.
//!
//! Multi-statement writes that read before they write use [`WriteTx`].
//!
//! Functions that run inside a caller's transaction take any
//! [`sqlx::SqliteExecutor`], so they accept both `db.pool()` and `&mut *tx`.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, habit, user, NewHabit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:habits.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a user together with their profile
//!     let alice = user::create_user(db.pool(), "c27fb365-0c84-4cf2-8555-814bb065e448", "alice", "alice@example.com").await?;
//!
//!     // Create a habit
//!     let habit = habit::create_habit(db.pool(), &alice.id, &NewHabit::titled("Read")).await?;
//!     println!("created habit {}", habit.id);
//!
//!     Ok(())
//! }
//! ```

pub mod badge;
pub mod challenge;
pub mod contract;
pub mod entry;
pub mod error;
pub mod feed;
pub mod follow;
pub mod habit;
pub mod models;
pub mod points;
pub mod report;
pub mod social;
pub mod stack;
pub mod tx;
pub mod user;
pub mod user_profile;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    AwardedBadge, Badge, Challenge, Comment, FeedItem, FeedKind, Habit, HabitCategory,
    HabitContract, HabitEntry, HabitFrequency, HabitStack, HabitUpdate, LedgerEntry, NewHabit,
    NewHabitContract, NewHabitStack, NewLedgerEntry, ProfileSettings, Reaction, User,
    UserProfile, UserSummary,
};
pub use tx::WriteTx;
pub use validation::ValidationError;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Handle to the habit store. Cheap to clone; clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub const DEFAULT_POOL_SIZE: u32 = 20;

    /// Open the store at `url`, e.g. `sqlite:data/habits.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Open the store with at most `pool_size` connections.
    ///
    /// Foreign keys are switched on for every connection; habit deletion
    /// relies on them to cascade entries and detach ledger rows.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !url.contains(":memory:") {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        info!(url, pool_size, "Opened habit store");
        Ok(Self { pool })
    }

    /// A private in-memory store with the schema applied.
    ///
    /// Each `:memory:` connection is a separate database, hence one connection.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect_with_pool_size("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Apply pending migrations, including the badge catalogue seed.
    pub async fn migrate(&self) -> Result<()> {
        debug!("Applying migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Start a transaction holding the write lock, see [`WriteTx`].
    pub async fn begin_write(&self) -> Result<WriteTx> {
        WriteTx::begin(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
