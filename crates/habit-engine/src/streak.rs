//! Streak computation.
//!
//! Streaks are recomputed from the full list of completed dates on every
//! mutation rather than tracked incrementally, so backfilled days (completing
//! yesterday after today) always produce the same result as in-order
//! completion.

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Streak derived from a habit's completed dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakState {
    /// Consecutive days ending at the most recent completion.
    pub current: i64,
    /// Most recent completed date.
    pub last_completed: Option<NaiveDate>,
}

/// Compute the trailing run from completed dates sorted most recent first.
pub fn compute_streak(dates_desc: &[NaiveDate]) -> StreakState {
    let Some((&latest, rest)) = dates_desc.split_first() else {
        return StreakState {
            current: 0,
            last_completed: None,
        };
    };

    let mut streak = 1;
    let mut cursor = latest;
    for &date in rest {
        match cursor.checked_sub_days(Days::new(1)) {
            Some(expected) if date == expected => {
                streak += 1;
                cursor = date;
            }
            _ => break,
        }
    }

    StreakState {
        current: streak,
        last_completed: Some(latest),
    }
}

/// "Never miss twice": false when the two most recent misses fall on consecutive days.
pub fn never_miss_twice(missed_desc: &[NaiveDate]) -> bool {
    match missed_desc {
        [latest, previous, ..] => (*latest - *previous).num_days() != 1,
        _ => true,
    }
}
