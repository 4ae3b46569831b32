//! End-to-end behavior of the engine and reporter.
//!
//! Most scenarios run on an in-memory database. Concurrency scenarios use a
//! file database so that writers hold separate connections and contend for
//! SQLite's write lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use database::{badge, entry, feed, habit, points, user, user_profile, Database, FeedKind, NewHabit};
use habit_engine::{
    DatabaseFeed, EngineError, FeedEvent, FeedPublisher, FixedClock, LeaderboardWindow, NoOpFeed,
    Reporter, StreakEngine,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

struct Harness {
    db: Database,
    clock: Arc<FixedClock>,
    engine: Arc<StreakEngine>,
    reporter: Reporter,
}

async fn harness_with(feed: impl FnOnce(&Database) -> Arc<dyn FeedPublisher>) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(FixedClock::new(day(31)));
    let engine = Arc::new(StreakEngine::new(db.clone(), clock.clone(), feed(&db)));
    let reporter = Reporter::new(db.clone(), clock.clone());
    Harness {
        db,
        clock,
        engine,
        reporter,
    }
}

async fn harness() -> Harness {
    harness_with(|_| Arc::new(NoOpFeed)).await
}

/// A harness over a WAL database file. Keep the directory alive for the test.
async fn file_harness() -> (tempfile::TempDir, Harness) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("habits.db").display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();

    let clock = Arc::new(FixedClock::new(day(31)));
    let feed: Arc<dyn FeedPublisher> = Arc::new(DatabaseFeed::new(db.clone()));
    let engine = Arc::new(StreakEngine::new(db.clone(), clock.clone(), feed));
    let reporter = Reporter::new(db.clone(), clock.clone());
    let harness = Harness {
        db,
        clock,
        engine,
        reporter,
    };
    (dir, harness)
}

async fn add_user(db: &Database, id: &str, username: &str) {
    user::create_user(db.pool(), id, username, &format!("{}@example.com", username))
        .await
        .unwrap();
}

async fn add_habit(db: &Database, user_id: &str, title: &str) -> i64 {
    habit::create_habit(db.pool(), user_id, &NewHabit::titled(title))
        .await
        .unwrap()
        .id
}

async fn badge_codes(db: &Database, user_id: &str) -> Vec<String> {
    badge::list_user_badges(db.pool(), user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.badge_code)
        .collect()
}

struct FailingFeed;

#[async_trait]
impl FeedPublisher for FailingFeed {
    async fn publish(&self, _event: FeedEvent) -> habit_engine::Result<()> {
        Err(EngineError::Feed("feed unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_completing_twice_grants_points_once() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    let first = h.engine.record_completion("u-1", run, Some(day(10)), None).await.unwrap();
    let second = h.engine.record_completion("u-1", run, Some(day(10)), None).await.unwrap();

    assert!(first.newly_completed);
    assert!(!second.newly_completed);
    assert_eq!(second.points_awarded, 0);
    assert_eq!(second.current_streak, first.current_streak);
    assert_eq!(second.entry.id, first.entry.id);
    assert_eq!(second.profile.total_points, first.profile.total_points);

    let ledger = points::list_for_user(h.db.pool(), "u-1", 100).await.unwrap();
    let completion_rows = ledger.iter().filter(|l| l.entry_id.is_some()).count();
    assert_eq!(completion_rows, 1);
}

#[tokio::test]
async fn test_backfill_matches_in_order_completion() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let in_order = add_habit(&h.db, "u-1", "In order").await;
    let backfilled = add_habit(&h.db, "u-1", "Backfilled").await;

    for d in [1, 2, 3] {
        h.engine.record_completion("u-1", in_order, Some(day(d)), None).await.unwrap();
    }
    for d in [3, 1, 2] {
        h.engine.record_completion("u-1", backfilled, Some(day(d)), None).await.unwrap();
    }

    let a = habit::get_habit(h.db.pool(), in_order).await.unwrap();
    let b = habit::get_habit(h.db.pool(), backfilled).await.unwrap();
    assert_eq!(a.current_streak, 3);
    assert_eq!(b.current_streak, a.current_streak);
    assert_eq!(b.best_streak, 3);
    assert_eq!(b.last_completed, Some(day(3)));
}

#[tokio::test]
async fn test_three_days_then_uncomplete_middle() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;

    // Earn the one-off first-habit badge up front so only completion points move below
    let warmup = add_habit(&h.db, "u-1", "Warm up").await;
    h.engine.record_completion("u-1", warmup, Some(day(1)), None).await.unwrap();

    let read = add_habit(&h.db, "u-1", "Read").await;
    let before = user_profile::get_profile(h.db.pool(), "u-1").await.unwrap().total_points;

    let mut last = None;
    for d in [10, 11, 12] {
        last = Some(h.engine.record_completion("u-1", read, Some(day(d)), None).await.unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.current_streak, 3);
    assert_eq!(last.best_streak, 3);
    assert_eq!(last.profile.total_points - before, 30);

    let undone = h.engine.record_incomplete("u-1", read, Some(day(11))).await.unwrap();
    assert!(!undone.entry.completed);
    assert_eq!(undone.current_streak, 1);
    assert_eq!(undone.best_streak, 3);
    // Un-completing never claws back points
    assert_eq!(undone.profile.total_points - before, 30);

    let stored = habit::get_habit(h.db.pool(), read).await.unwrap();
    assert_eq!(stored.current_streak, 1);
    assert_eq!(stored.best_streak, 3);
    assert_eq!(stored.last_completed, Some(day(12)));
}

#[tokio::test]
async fn test_seven_day_badge_awarded_once() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    for d in 1..=9 {
        let completion = h.engine.record_completion("u-1", run, Some(day(d)), None).await.unwrap();
        let streak_badges: Vec<&str> = completion
            .badges_awarded
            .iter()
            .map(|b| b.code.as_str())
            .filter(|code| code.starts_with("STREAK_"))
            .collect();

        if d == 7 {
            assert_eq!(streak_badges, vec!["STREAK_7"]);
        } else {
            assert!(streak_badges.is_empty(), "day {} awarded {:?}", d, streak_badges);
        }
    }

    let codes = badge_codes(&h.db, "u-1").await;
    assert_eq!(codes.iter().filter(|c| *c == "STREAK_7").count(), 1);
    assert!(codes.contains(&"FIRST_HABIT".to_string()));
}

#[tokio::test]
async fn test_backfill_jump_past_threshold_still_awards() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    // Two runs of four days joined by one backfilled day
    for d in [1, 2, 3, 4, 6, 7, 8, 9] {
        h.engine.record_completion("u-1", run, Some(day(d)), None).await.unwrap();
    }
    let joined = h.engine.record_completion("u-1", run, Some(day(5)), None).await.unwrap();

    assert_eq!(joined.current_streak, 9);
    let codes: Vec<&str> = joined.badges_awarded.iter().map(|b| b.code.as_str()).collect();
    assert_eq!(codes, vec!["STREAK_7"]);
}

#[tokio::test]
async fn test_current_never_exceeds_best() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    let steps: [(u32, bool); 10] = [
        (1, true),
        (2, true),
        (3, true),
        (2, false),
        (5, true),
        (4, true),
        (2, true),
        (3, false),
        (6, true),
        (1, false),
    ];

    for (d, complete) in steps {
        let (current, best) = if complete {
            let c = h.engine.record_completion("u-1", run, Some(day(d)), None).await.unwrap();
            (c.current_streak, c.best_streak)
        } else {
            let c = h.engine.record_incomplete("u-1", run, Some(day(d))).await.unwrap();
            (c.current_streak, c.best_streak)
        };
        assert!(current <= best, "step {:?}: {} > {}", (d, complete), current, best);

        let stored = habit::get_habit(h.db.pool(), run).await.unwrap();
        assert!(stored.current_streak <= stored.best_streak);
    }
}

#[tokio::test]
async fn test_micro_habit_earns_reduced_points() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let floss = habit::create_habit(
        h.db.pool(),
        "u-1",
        &NewHabit {
            is_micro: true,
            ..NewHabit::titled("Floss one tooth")
        },
    )
    .await
    .unwrap();

    let completion = h.engine.record_completion("u-1", floss.id, Some(day(3)), None).await.unwrap();
    assert_eq!(completion.points_awarded, 5);
    assert_eq!(completion.entry.points_earned, 5);
}

#[tokio::test]
async fn test_other_users_habit_is_not_found() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    add_user(&h.db, "u-2", "bob").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    let err = h.engine.record_completion("u-2", run, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "Habit", .. }));

    let err = h.engine.record_incomplete("u-2", run, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    let err = h.engine.record_completion("u-1", 9999, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));

    let entries = entry::list_entries(h.db.pool(), run, None, None).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_profile_points_match_ledger() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    let read = add_habit(&h.db, "u-1", "Read").await;

    for d in 1..=8 {
        h.engine.record_completion("u-1", run, Some(day(d)), None).await.unwrap();
    }
    h.engine.record_completion("u-1", read, Some(day(8)), None).await.unwrap();
    h.engine.record_incomplete("u-1", run, Some(day(4))).await.unwrap();

    let ledger_total = points::total_for_user(h.db.pool(), "u-1").await.unwrap();
    let profile = user_profile::get_profile(h.db.pool(), "u-1").await.unwrap();
    assert_eq!(profile.total_points, ledger_total);
    // 9 completions, FIRST_HABIT and STREAK_7
    assert_eq!(ledger_total, 9 * 10 + 50 + 100);
    assert_eq!(profile.level, ledger_total / 100 + 1);
    assert_eq!(profile.total_completions, 8);
    assert_eq!(profile.current_streak, 4);
    assert_eq!(profile.best_streak, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_grant_once() {
    let (_dir, h) = file_harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&h.engine);
            tokio::spawn(async move { engine.record_completion("u-1", run, Some(day(20)), None).await })
        })
        .collect();

    let mut newly = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().newly_completed {
            newly += 1;
        }
    }
    assert_eq!(newly, 1);

    let ledger = points::list_for_user(h.db.pool(), "u-1", 100).await.unwrap();
    assert_eq!(ledger.iter().filter(|l| l.entry_id.is_some()).count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_habits_complete_concurrently() {
    let (_dir, h) = file_harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let mut habits = Vec::new();
    for i in 0..16 {
        habits.push(add_habit(&h.db, "u-1", &format!("Habit {}", i)).await);
    }

    for round in 0..3 {
        let tasks: Vec<_> = habits
            .iter()
            .map(|&habit_id| {
                let engine = Arc::clone(&h.engine);
                let date = day(20 + round);
                tokio::spawn(async move { engine.record_completion("u-1", habit_id, Some(date), None).await })
            })
            .collect();

        for task in tasks {
            let completion = task.await.unwrap().unwrap();
            assert!(completion.newly_completed);
        }
    }

    let ledger = points::list_for_user(h.db.pool(), "u-1", 1000).await.unwrap();
    let ledger_sum: i64 = ledger.iter().map(|l| l.amount).sum();
    let profile = user_profile::get_profile(h.db.pool(), "u-1").await.unwrap();

    // 48 completions at 10 points and the first-habit badge
    assert_eq!(ledger_sum, 530);
    assert_eq!(profile.total_points, ledger_sum);
    assert_eq!(profile.total_completions, 48);
    assert_eq!(profile.current_streak, 3);
    assert_eq!(badge_codes(&h.db, "u-1").await, vec!["FIRST_HABIT"]);
}

#[tokio::test]
async fn test_feed_failure_keeps_completion() {
    let h = harness_with(|_| Arc::new(FailingFeed)).await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    let completion = h.engine.record_completion("u-1", run, Some(day(2)), None).await.unwrap();
    assert!(completion.newly_completed);

    let stored = entry::get_entry(h.db.pool(), run, day(2)).await.unwrap().unwrap();
    assert!(stored.completed);
    assert_eq!(
        user_profile::get_profile(h.db.pool(), "u-1").await.unwrap().total_points,
        completion.profile.total_points
    );
}

#[tokio::test]
async fn test_database_feed_records_completion_and_badge() {
    let h = harness_with(|db| Arc::new(DatabaseFeed::new(db.clone()))).await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;

    h.engine.record_completion("u-1", run, Some(day(2)), None).await.unwrap();

    let items = feed::list_feed_for(h.db.pool(), "u-1", 10).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items
        .iter()
        .any(|i| i.kind == FeedKind::Completion && i.message == "completed Run" && i.habit_id == Some(run)));
    assert!(items
        .iter()
        .any(|i| i.kind == FeedKind::Badge && i.badge_code.as_deref() == Some("FIRST_HABIT")));
}

#[tokio::test]
async fn test_statistics_for_new_user() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;

    let stats = h.reporter.user_statistics("u-1").await.unwrap();
    assert_eq!(stats.total_habits, 0);
    assert_eq!(stats.completion_rate, 0.0);
    assert_eq!(stats.average_streak, 0.0);
    assert_eq!(stats.total_points, 0);

    let run = add_habit(&h.db, "u-1", "Run").await;
    let analytics = h.reporter.habit_analytics("u-1", run).await.unwrap();
    assert_eq!(analytics.total_entries, 0);
    assert_eq!(analytics.completion_rate, 0.0);
}

#[tokio::test]
async fn test_statistics_windows_and_rates() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    let read = add_habit(&h.db, "u-1", "Read").await;

    // Today is March 31: the week starts March 24, the month March 1
    for d in [1, 25, 30, 31] {
        h.engine.record_completion("u-1", run, Some(day(d)), None).await.unwrap();
    }
    h.engine.record_incomplete("u-1", read, Some(day(31))).await.unwrap();

    let stats = h.reporter.user_statistics("u-1").await.unwrap();
    assert_eq!(stats.total_habits, 2);
    assert_eq!(stats.active_habits, 2);
    assert_eq!(stats.total_completions, 4);
    assert_eq!(stats.completion_rate, 80.0);
    assert_eq!(stats.this_week_completions, 3);
    assert_eq!(stats.this_month_completions, 4);
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.average_streak, 1.0);

    let analytics = h.reporter.habit_analytics("u-1", run).await.unwrap();
    assert_eq!(analytics.completion_rate, 100.0);
    assert_eq!(analytics.week_completions, 3);

    assert!(h.reporter.habit_analytics("u-2", run).await.is_err());
}

#[tokio::test]
async fn test_series_cover_trailing_days() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    let read = add_habit(&h.db, "u-1", "Read").await;

    h.engine.record_completion("u-1", run, Some(day(31)), None).await.unwrap();
    h.engine.record_completion("u-1", read, Some(day(31)), None).await.unwrap();
    h.engine.record_completion("u-1", run, Some(day(2)), None).await.unwrap();

    let weekly = h.reporter.weekly_series("u-1").await.unwrap();
    assert_eq!(weekly.len(), 7);
    assert_eq!(weekly[0].date, day(25));
    assert_eq!(weekly[6].completions, 2);

    let monthly = h.reporter.monthly_series("u-1").await.unwrap();
    assert_eq!(monthly.len(), 30);
    assert_eq!(monthly[0].date, day(2));
    assert_eq!(monthly[0].completions, 1);
    assert_eq!(monthly.iter().map(|d| d.completions).sum::<i64>(), 3);
}

#[tokio::test]
async fn test_leaderboard_windows() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    add_user(&h.db, "u-2", "bob").await;
    let alice_run = add_habit(&h.db, "u-1", "Run").await;
    let bob_run = add_habit(&h.db, "u-2", "Run").await;

    for d in [10, 11, 12] {
        h.engine.record_completion("u-1", alice_run, Some(day(d)), None).await.unwrap();
    }
    h.engine.record_completion("u-2", bob_run, Some(day(30)), None).await.unwrap();

    let weekly = h.reporter.leaderboard(LeaderboardWindow::Weekly).await.unwrap();
    assert_eq!(weekly[0].username, "bob");
    assert_eq!(weekly[0].window_completions, 1);
    assert_eq!(weekly[1].window_completions, 0);

    let monthly = h.reporter.leaderboard(LeaderboardWindow::Monthly).await.unwrap();
    assert_eq!(monthly[0].username, "alice");
    assert_eq!(monthly[0].window_completions, 3);
    assert_eq!(monthly[0].current_streak, 3);
}

#[tokio::test]
async fn test_level_progress_corrects_stale_level() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    h.engine.record_completion("u-1", run, Some(day(1)), None).await.unwrap();

    user_profile::set_level(h.db.pool(), "u-1", 9).await.unwrap();

    let progress = h.reporter.level_progress("u-1").await.unwrap();
    assert_eq!(progress.total_points, 60);
    assert_eq!(progress.level, 1);
    assert_eq!(progress.points_for_next_level, 40);

    let profile = user_profile::get_profile(h.db.pool(), "u-1").await.unwrap();
    assert_eq!(profile.level, 1);
}

#[tokio::test]
async fn test_today_view_and_community_stats() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    add_user(&h.db, "u-2", "bob").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    let read = add_habit(&h.db, "u-1", "Read").await;
    let bob_run = add_habit(&h.db, "u-2", "Run").await;

    h.engine.record_completion("u-1", run, None, None).await.unwrap();
    h.engine.record_completion("u-1", read, Some(day(30)), None).await.unwrap();

    let today = h.reporter.today("u-1").await.unwrap();
    assert_eq!(today.len(), 2);
    assert!(today.iter().find(|t| t.id == run).unwrap().completed_today);
    assert!(!today.iter().find(|t| t.id == read).unwrap().completed_today);

    let community = h.reporter.community_stats().await.unwrap();
    assert_eq!(community.total_users, 2);
    assert_eq!(community.total_habits, 3);
    assert_eq!(community.completions_today, 1);
    assert_eq!(community.active_today, 1);

    h.clock.advance(1);
    h.engine.record_completion("u-2", bob_run, None, None).await.unwrap();
    let community = h.reporter.community_stats().await.unwrap();
    assert_eq!(community.completions_today, 1);
    assert_eq!(community.active_today, 1);
}

#[tokio::test]
async fn test_never_miss_twice_and_streak_summary() {
    let h = harness().await;
    add_user(&h.db, "u-1", "alice").await;
    let run = add_habit(&h.db, "u-1", "Run").await;
    let read = add_habit(&h.db, "u-1", "Read").await;

    h.engine.record_incomplete("u-1", run, Some(day(5))).await.unwrap();
    assert!(h.reporter.never_miss_twice("u-1", run).await.unwrap());

    h.engine.record_incomplete("u-1", run, Some(day(6))).await.unwrap();
    assert!(!h.reporter.never_miss_twice("u-1", run).await.unwrap());

    h.engine.record_completion("u-1", read, Some(day(1)), None).await.unwrap();
    h.engine.record_completion("u-1", read, Some(day(2)), None).await.unwrap();

    let summary = h.reporter.streak_summary("u-1").await.unwrap();
    assert_eq!(summary.current_total, 2);
    assert_eq!(summary.best_total, 2);
    assert_eq!(summary.habits.len(), 2);
}
