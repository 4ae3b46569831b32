//! Level progression derived from total points.

use database::user_profile::{level_for_points, POINTS_PER_LEVEL};
use serde::Serialize;

/// Where a user stands within their current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: i64,
    pub total_points: i64,
    /// Points still needed to reach the next level.
    pub points_for_next_level: i64,
    pub points_in_current_level: i64,
    /// 0 to 100.
    pub progress_percentage: f64,
}

impl LevelProgress {
    pub fn from_points(total_points: i64) -> Self {
        let total_points = total_points.max(0);
        let level = level_for_points(total_points);
        let points_in_current_level = total_points - (level - 1) * POINTS_PER_LEVEL;

        Self {
            level,
            total_points,
            points_for_next_level: POINTS_PER_LEVEL - points_in_current_level,
            points_in_current_level,
            progress_percentage: points_in_current_level as f64 / POINTS_PER_LEVEL as f64 * 100.0,
        }
    }
}
