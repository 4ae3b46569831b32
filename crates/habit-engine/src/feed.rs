//! Activity feed boundary.

use async_trait::async_trait;
use database::feed::{create_feed_item, NewFeedItem};
use database::{Database, FeedKind};

use crate::error::{EngineError, Result};

/// Something worth announcing to followers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    HabitCompleted {
        user_id: String,
        habit_id: i64,
        habit_title: String,
        entry_id: i64,
    },
    BadgeEarned {
        user_id: String,
        badge_code: String,
        badge_name: String,
    },
}

impl FeedEvent {
    /// The user the event belongs to.
    pub fn user_id(&self) -> &str {
        match self {
            FeedEvent::HabitCompleted { user_id, .. } | FeedEvent::BadgeEarned { user_id, .. } => user_id,
        }
    }

    /// Human-readable feed message.
    pub fn message(&self) -> String {
        match self {
            FeedEvent::HabitCompleted { habit_title, .. } => format!("completed {}", habit_title),
            FeedEvent::BadgeEarned { badge_name, .. } => format!("earned the {} badge", badge_name),
        }
    }

    fn into_item(self) -> NewFeedItem {
        let message = self.message();
        match self {
            FeedEvent::HabitCompleted {
                user_id,
                habit_id,
                entry_id,
                ..
            } => NewFeedItem {
                user_id,
                kind: FeedKind::Completion,
                message,
                habit_id: Some(habit_id),
                badge_code: None,
                challenge_id: None,
                entry_id: Some(entry_id),
            },
            FeedEvent::BadgeEarned {
                user_id, badge_code, ..
            } => NewFeedItem {
                user_id,
                kind: FeedKind::Badge,
                message,
                habit_id: None,
                badge_code: Some(badge_code),
                challenge_id: None,
                entry_id: None,
            },
        }
    }
}

/// Receives feed events after a mutation commits.
///
/// Failures are logged by the caller and never undo the mutation.
#[async_trait]
pub trait FeedPublisher: Send + Sync {
    async fn publish(&self, event: FeedEvent) -> Result<()>;
}

/// Writes events to the `feed_items` table.
#[derive(Debug, Clone)]
pub struct DatabaseFeed {
    db: Database,
}

impl DatabaseFeed {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeedPublisher for DatabaseFeed {
    async fn publish(&self, event: FeedEvent) -> Result<()> {
        let item = event.into_item();
        let id = create_feed_item(self.db.pool(), &item)
            .await
            .map_err(|e| EngineError::Feed(e.to_string()))?;
        tracing::debug!(feed_item_id = id, user_id = %item.user_id, "Feed item published");
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpFeed;

#[async_trait]
impl FeedPublisher for NoOpFeed {
    async fn publish(&self, _event: FeedEvent) -> Result<()> {
        Ok(())
    }
}

/// Logs every event instead of storing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFeed;

#[async_trait]
impl FeedPublisher for LoggingFeed {
    async fn publish(&self, event: FeedEvent) -> Result<()> {
        tracing::info!("[feed] {} {}", event.user_id(), event.message());
        Ok(())
    }
}
