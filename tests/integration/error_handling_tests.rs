// Error handling and edge case tests

use std::sync::Arc;

use chrono::NaiveDate;
use minded_core_lib::commands::AppState;
use minded_core_lib::db::store::{AggregateStore, SqliteAggregateStore};
use minded_core_lib::db::DbPool;
use minded_core_lib::error::{AppError, AppResult};
use minded_core_lib::models::activity::{parse_date, ActivityEvent, ActivityMetrics, DateRange};
use minded_core_lib::models::context::RequestContext;
use minded_core_lib::models::leaderboard::{LeaderboardEntry, LeaderboardMetric};
use minded_core_lib::models::profile::UserProfileRecord;
use minded_core_lib::models::score::{CategoryWeights, DailyScore};
use minded_core_lib::models::settings::ScoringSettingsUpdate;
use minded_core_lib::services::profile_service::ProfileService;
use minded_core_lib::services::settings_service::SettingsService;
use minded_core_lib::services::streak_evaluator::StreakEvaluator;
use tempfile::tempdir;

async fn setup_test_environment() -> (DbPool, Arc<dyn AggregateStore>, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("test.sqlite")).expect("db pool");
    let store: Arc<dyn AggregateStore> = Arc::new(SqliteAggregateStore::new(pool.clone()));
    (pool, store, dir)
}

/// SQLite-backed store whose score writes fail for one day.
struct FailingScoreStore {
    inner: SqliteAggregateStore,
    failing_day: NaiveDate,
}

impl AggregateStore for FailingScoreStore {
    fn get_activity_metrics(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Option<ActivityMetrics>> {
        self.inner.get_activity_metrics(user_id, range)
    }

    fn record_activity(
        &self,
        user_id: &str,
        date: &NaiveDate,
        event: &ActivityEvent,
    ) -> AppResult<()> {
        self.inner.record_activity(user_id, date, event)
    }

    fn upsert_daily_score(&self, user_id: &str, score: &DailyScore) -> AppResult<()> {
        if score.date == self.failing_day {
            return Err(AppError::database("disk I/O error"));
        }
        self.inner.upsert_daily_score(user_id, score)
    }

    fn get_score_history(&self, user_id: &str, range: &DateRange) -> AppResult<Vec<DailyScore>> {
        self.inner.get_score_history(user_id, range)
    }

    fn get_full_score_history(&self, user_id: &str) -> AppResult<Vec<DailyScore>> {
        self.inner.get_full_score_history(user_id)
    }

    fn delete_scores_before(&self, user_id: &str, cutoff: &NaiveDate) -> AppResult<usize> {
        self.inner.delete_scores_before(user_id, cutoff)
    }

    fn get_leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        self.inner.get_leaderboard(metric, limit)
    }

    fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> AppResult<()> {
        self.inner.replace_leaderboard(entries)
    }

    fn find_profile(&self, user_id: &str) -> AppResult<Option<UserProfileRecord>> {
        self.inner.find_profile(user_id)
    }

    fn insert_profile(&self, profile: &UserProfileRecord) -> AppResult<()> {
        self.inner.insert_profile(profile)
    }

    fn list_profiles(&self) -> AppResult<Vec<UserProfileRecord>> {
        self.inner.list_profiles()
    }
}

fn day(value: &str) -> NaiveDate {
    parse_date(value).expect("valid date")
}

fn score(date: &str, global: f64) -> DailyScore {
    DailyScore {
        date: day(date),
        global_score: global,
        habits_score: global,
        tasks_score: global,
        finance_score: global,
        health_score: global,
        momentum_index: 50.0,
        burnout_index: 0.0,
    }
}

#[tokio::test]
async fn test_invalid_date_is_compute_failure() {
    let err = parse_date("2025-13-40").unwrap_err();
    assert!(matches!(err, AppError::ComputeFailure { .. }));

    let err = DateRange::parse("2025-06-10", "2025-06-01").unwrap_err();
    assert!(matches!(err, AppError::ComputeFailure { .. }));
}

#[tokio::test]
async fn test_out_of_order_history_is_rejected() {
    let evaluator = StreakEvaluator::default();
    let history = vec![score("2025-06-08", 80.0), score("2025-06-09", 80.0)];
    let err = evaluator.evaluate(&history, day("2025-06-09")).unwrap_err();
    assert!(matches!(err, AppError::ComputeFailure { .. }));

    let duplicated = vec![score("2025-06-09", 80.0), score("2025-06-09", 80.0)];
    assert!(evaluator.evaluate(&duplicated, day("2025-06-09")).is_err());
}

#[tokio::test]
async fn test_empty_history_has_no_streaks() {
    let state = StreakEvaluator::default()
        .evaluate(&[], day("2025-06-09"))
        .expect("evaluate");
    assert_eq!(state.current_streak, 0);
    assert_eq!(state.longest_streak, 0);
}

#[tokio::test]
async fn test_score_upsert_for_unknown_user_fails() {
    let (_pool, store, _dir) = setup_test_environment().await;
    let result = store.upsert_daily_score("ghost", &score("2025-06-09", 50.0));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_duplicate_profile_is_conflict() {
    let (_pool, store, _dir) = setup_test_environment().await;
    let profile = ProfileService::new(Arc::clone(&store))
        .create("Dup")
        .expect("create profile");

    let err = store.insert_profile(&profile).unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
}

#[tokio::test]
async fn test_invalid_settings_are_rejected_and_not_saved() {
    let (pool, _store, _dir) = setup_test_environment().await;
    let settings = SettingsService::new(pool);

    let err = settings
        .update(ScoringSettingsUpdate {
            streak_threshold: Some(140.0),
            weights: None,
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = settings
        .update(ScoringSettingsUpdate {
            streak_threshold: None,
            weights: Some(CategoryWeights {
                habits: 0.5,
                tasks: 0.5,
                finance: 0.5,
                health: 0.0,
            }),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = settings
        .update(ScoringSettingsUpdate {
            streak_threshold: None,
            weights: Some(CategoryWeights {
                habits: 1.2,
                tasks: -0.2,
                finance: 0.0,
                health: 0.0,
            }),
        })
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let current = settings.get().expect("settings");
    assert_eq!(current.streak_threshold, 30.0);
}

#[tokio::test]
async fn test_invalid_activity_events() {
    let (_pool, store, _dir) = setup_test_environment().await;
    let profile = ProfileService::new(Arc::clone(&store))
        .create("Edge")
        .expect("create profile");
    let activity = minded_core_lib::services::activity_service::ActivityService::new(store);
    let ctx = RequestContext::for_user(profile.user_id);
    let date = day("2025-06-09");

    for event in [
        ActivityEvent::FocusSession { minutes: 0 },
        ActivityEvent::HabitsExpected { count: -2 },
        ActivityEvent::Finance {
            budget_cents: 100,
            spent_cents: -1,
        },
    ] {
        let err = activity.record(&ctx, date, event).unwrap_err();
        match err {
            AppError::Validation { details, .. } => assert!(details.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    let metrics = activity
        .get_activity_metrics(&ctx, &DateRange::single(date))
        .expect("metrics");
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn test_blank_identity_is_unauthenticated() {
    let ctx = RequestContext::for_user("   ");
    assert!(matches!(ctx.require_user(), Err(AppError::Unauthenticated)));
}

#[tokio::test]
async fn test_range_recompute_surfaces_store_failure() {
    let (pool, _store, _dir) = setup_test_environment().await;
    let store: Arc<dyn AggregateStore> = Arc::new(FailingScoreStore {
        inner: SqliteAggregateStore::new(pool.clone()),
        failing_day: day("2025-06-02"),
    });
    let state = AppState::with_store(pool, store);
    let profile = state.profiles().create("Flaky").expect("create profile");
    let ctx = RequestContext::for_user(profile.user_id);

    let range = DateRange::new(day("2025-06-01"), day("2025-06-03")).expect("range");
    let err = state.scores().recompute_range(&ctx, &range).unwrap_err();
    assert!(matches!(err, AppError::Database { .. }));

    // The day before the failure was written; nothing after it was.
    let stored = state
        .scores()
        .get_score_history(&ctx, &range)
        .expect("history");
    let dates: Vec<NaiveDate> = stored.iter().map(|score| score.date).collect();
    assert_eq!(dates, vec![day("2025-06-01")]);
}
