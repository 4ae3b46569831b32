//! Badge eligibility rules.
//!
//! Thresholds are checked with `>=`: a streak that jumps past a milestone
//! (e.g. a backfilled day joining two runs) still earns the badge. The unique
//! (user, badge) constraint keeps each award to one per user.

use serde::Serialize;

/// Badge codes seeded by the schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BadgeCode {
    FirstHabit,
    Streak7,
    Streak30,
    Streak100,
    Completions100,
    MicroMaster,
}

impl BadgeCode {
    pub const ALL: [BadgeCode; 6] = [
        BadgeCode::FirstHabit,
        BadgeCode::Streak7,
        BadgeCode::Streak30,
        BadgeCode::Streak100,
        BadgeCode::Completions100,
        BadgeCode::MicroMaster,
    ];

    /// Code stored in the `badges` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCode::FirstHabit => "FIRST_HABIT",
            BadgeCode::Streak7 => "STREAK_7",
            BadgeCode::Streak30 => "STREAK_30",
            BadgeCode::Streak100 => "STREAK_100",
            BadgeCode::Completions100 => "COMPLETIONS_100",
            BadgeCode::MicroMaster => "MICRO_MASTER",
        }
    }

    /// Whether `progress` meets this badge's threshold.
    pub fn is_earned(&self, progress: &BadgeProgress) -> bool {
        match self {
            BadgeCode::FirstHabit => progress.habit_count >= 1,
            BadgeCode::Streak7 => progress.current_streak >= 7,
            BadgeCode::Streak30 => progress.current_streak >= 30,
            BadgeCode::Streak100 => progress.current_streak >= 100,
            BadgeCode::Completions100 => progress.total_completions >= 100,
            BadgeCode::MicroMaster => progress.micro_completions >= 50,
        }
    }
}

/// Counters a completion is judged against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeProgress {
    /// Habits the user owns.
    pub habit_count: i64,
    /// Streak of the habit just completed.
    pub current_streak: i64,
    /// Completed entries across all of the user's habits.
    pub total_completions: i64,
    /// Completed entries of the user's micro habits.
    pub micro_completions: i64,
}

/// Badges whose thresholds `progress` meets, in catalogue order.
pub fn earned(progress: &BadgeProgress) -> Vec<BadgeCode> {
    BadgeCode::ALL
        .into_iter()
        .filter(|code| code.is_earned(progress))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_completion_earns_first_habit() {
        let progress = BadgeProgress {
            habit_count: 1,
            current_streak: 1,
            total_completions: 1,
            micro_completions: 0,
        };
        assert_eq!(earned(&progress), vec![BadgeCode::FirstHabit]);
    }

    #[test]
    fn test_streak_jump_earns_every_passed_milestone() {
        let progress = BadgeProgress {
            habit_count: 2,
            current_streak: 31,
            total_completions: 40,
            micro_completions: 0,
        };
        assert_eq!(
            earned(&progress),
            vec![BadgeCode::FirstHabit, BadgeCode::Streak7, BadgeCode::Streak30]
        );
    }

    #[test]
    fn test_completion_milestones() {
        let progress = BadgeProgress {
            habit_count: 3,
            current_streak: 2,
            total_completions: 100,
            micro_completions: 50,
        };
        let codes = earned(&progress);
        assert!(codes.contains(&BadgeCode::Completions100));
        assert!(codes.contains(&BadgeCode::MicroMaster));
        assert!(!codes.contains(&BadgeCode::Streak7));
    }

    #[test]
    fn test_codes_match_schema() {
        let codes: Vec<&str> = BadgeCode::ALL.iter().map(BadgeCode::as_str).collect();
        assert_eq!(
            codes,
            vec!["FIRST_HABIT", "STREAK_7", "STREAK_30", "STREAK_100", "COMPLETIONS_100", "MICRO_MASTER"]
        );
    }
}
