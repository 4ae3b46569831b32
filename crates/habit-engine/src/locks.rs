//! Per-habit mutual exclusion.
//!
//! At most one completion mutation per habit runs at a time inside this
//! process. Combined with the SQLite transaction around each mutation, the
//! streak recompute, ledger grant and profile refresh are observed together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Prune dead entries once the map grows past this many habits.
const PRUNE_THRESHOLD: usize = 1024;

/// Registry of async locks keyed by habit ID.
#[derive(Debug, Default)]
pub struct HabitLocks {
    locks: Mutex<HashMap<i64, Weak<AsyncMutex<()>>>>,
}

impl HabitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `habit_id`. Released when the guard drops.
    pub async fn lock(&self, habit_id: i64) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, weak| weak.strong_count() > 0);
            }
            match locks.get(&habit_id).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    let mutex = Arc::new(AsyncMutex::new(()));
                    locks.insert(habit_id, Arc::downgrade(&mutex));
                    mutex
                }
            }
        };

        mutex.lock_owned().await
    }

    /// Number of habits with a live lock.
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
