use chrono::{Duration, NaiveDate};
use minded_core_lib::commands::AppState;
use minded_core_lib::db::DbPool;
use minded_core_lib::models::activity::{parse_date, ActivityEvent, DateRange};
use minded_core_lib::models::context::RequestContext;
use minded_core_lib::models::score::{CategoryWeights, ScoreCategory};
use minded_core_lib::models::settings::ScoringSettingsUpdate;
use tempfile::tempdir;

fn setup() -> (AppState, RequestContext, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("test.sqlite")).expect("db pool");
    let state = AppState::new(pool).expect("app state");
    let profile = state.profiles().create("Rowan").expect("create profile");
    let ctx = RequestContext::for_user(profile.user_id);
    (state, ctx, dir)
}

fn day(value: &str) -> NaiveDate {
    parse_date(value).expect("valid date")
}

fn record_all(state: &AppState, ctx: &RequestContext, date: NaiveDate, events: Vec<ActivityEvent>) {
    for event in events {
        state.activity().record(ctx, date, event).expect("record event");
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_full_day_composite_score() {
    let (state, ctx, _dir) = setup();
    let date = day("2025-06-10");

    let mut events = vec![ActivityEvent::HabitsExpected { count: 4 }];
    events.extend(std::iter::repeat(ActivityEvent::HabitCheckIn).take(3));
    events.extend(std::iter::repeat(ActivityEvent::TaskCreated).take(4));
    events.extend(std::iter::repeat(ActivityEvent::TaskCompleted).take(3));
    events.push(ActivityEvent::FocusSession { minutes: 60 });
    events.push(ActivityEvent::Health {
        sleep_minutes: 450,
        exercise_minutes: 30,
    });
    events.push(ActivityEvent::Finance {
        budget_cents: 5_000,
        spent_cents: 4_000,
    });
    record_all(&state, &ctx, date, events);

    let computation = state.scores().recompute(&ctx, date).expect("recompute");
    let score = &computation.score;

    assert_close(score.habits_score, 75.0);
    assert_close(score.tasks_score, 70.0);
    assert_close(score.finance_score, 100.0);
    assert_close(score.health_score, 100.0);
    // 0.35 * 75 + 0.35 * 70 + 0.15 * 100 + 0.15 * 100
    assert_close(score.global_score, 80.75);
    assert_eq!(score.momentum_index, 50.0);
    assert_close(score.burnout_index, 4.17);
    assert_eq!(computation.breakdown.categories_with_data.len(), 4);
}

#[test]
fn test_missing_categories_are_reweighted() {
    let (state, ctx, _dir) = setup();
    let date = day("2025-06-10");
    record_all(
        &state,
        &ctx,
        date,
        vec![
            ActivityEvent::HabitsExpected { count: 2 },
            ActivityEvent::HabitCheckIn,
        ],
    );

    let computation = state.scores().recompute(&ctx, date).expect("recompute");

    assert_eq!(
        computation.breakdown.categories_with_data,
        vec![ScoreCategory::Habits]
    );
    assert_close(computation.breakdown.applied_weights.habits, 1.0);
    assert_close(computation.score.global_score, 50.0);
    assert_eq!(computation.score.finance_score, 100.0);
}

#[test]
fn test_zero_expected_habits_never_divides_by_zero() {
    let (state, ctx, _dir) = setup();
    let date = day("2025-06-10");
    record_all(
        &state,
        &ctx,
        date,
        vec![
            ActivityEvent::HabitsExpected { count: 0 },
            ActivityEvent::HabitCheckIn,
            ActivityEvent::HabitMissed,
            ActivityEvent::TaskCreated,
            ActivityEvent::TaskCompleted,
        ],
    );

    let computation = state.scores().recompute(&ctx, date).expect("recompute");
    assert_eq!(computation.score.habits_score, 100.0);
    assert_eq!(
        computation.breakdown.categories_with_data,
        vec![ScoreCategory::Tasks]
    );
    // Tasks alone carry the composite: 0.8 * 1.0 completion, no focus.
    assert_close(computation.score.global_score, 80.0);
}

#[test]
fn test_custom_weights_change_composite() {
    let (state, ctx, _dir) = setup();
    let date = day("2025-06-10");
    record_all(
        &state,
        &ctx,
        date,
        vec![
            ActivityEvent::HabitsExpected { count: 1 },
            ActivityEvent::HabitCheckIn,
            ActivityEvent::TaskCreated,
        ],
    );

    state
        .settings()
        .update(ScoringSettingsUpdate {
            streak_threshold: None,
            weights: Some(CategoryWeights {
                habits: 0.8,
                tasks: 0.2,
                finance: 0.0,
                health: 0.0,
            }),
        })
        .expect("update weights");

    let computation = state.scores().recompute(&ctx, date).expect("recompute");
    // habits 100, tasks 0
    assert_close(computation.score.global_score, 80.0);
}

#[test]
fn test_week_of_scores_drives_streak_and_momentum() {
    let (state, ctx, _dir) = setup();
    let start = day("2025-06-01");
    let checkins = [4, 4, 0, 3, 4, 4, 2];

    for (offset, completed) in checkins.iter().enumerate() {
        let date = start + Duration::days(offset as i64);
        let mut events = vec![ActivityEvent::HabitsExpected { count: 4 }];
        events.extend(std::iter::repeat(ActivityEvent::HabitCheckIn).take(*completed));
        record_all(&state, &ctx, date, events);
    }

    let range = DateRange::new(start, day("2025-06-07")).expect("range");
    let scores = state.scores().recompute_range(&ctx, &range).expect("recompute range");
    let globals: Vec<f64> = scores.iter().map(|s| s.global_score).collect();
    assert_eq!(globals, vec![100.0, 100.0, 0.0, 75.0, 100.0, 100.0, 50.0]);

    // Day three drops well below its prior window.
    assert!(scores[2].momentum_index < 50.0);
    assert!(scores[6].momentum_index < 50.0);

    let streaks = state
        .scores()
        .get_streaks(&ctx, day("2025-06-07"))
        .expect("streaks");
    assert_eq!(streaks.current_streak, 4);
    assert_eq!(streaks.longest_streak, 4);

    // The next day has no score yet, so the run is still alive.
    let tomorrow = state
        .scores()
        .get_streaks(&ctx, day("2025-06-08"))
        .expect("streaks");
    assert_eq!(tomorrow.current_streak, 4);

    // Two days later the gap breaks it.
    let later = state
        .scores()
        .get_streaks(&ctx, day("2025-06-09"))
        .expect("streaks");
    assert_eq!(later.current_streak, 0);
    assert_eq!(later.longest_streak, 4);
}

#[test]
fn test_raised_threshold_shortens_streak() {
    let (state, ctx, _dir) = setup();
    let start = day("2025-06-01");
    for (offset, completed) in [2usize, 4, 4].iter().enumerate() {
        let date = start + Duration::days(offset as i64);
        let mut events = vec![ActivityEvent::HabitsExpected { count: 4 }];
        events.extend(std::iter::repeat(ActivityEvent::HabitCheckIn).take(*completed));
        record_all(&state, &ctx, date, events);
    }
    let range = DateRange::new(start, day("2025-06-03")).expect("range");
    state.scores().recompute_range(&ctx, &range).expect("recompute range");

    let relaxed = state.scores().get_streaks(&ctx, day("2025-06-03")).expect("streaks");
    assert_eq!(relaxed.current_streak, 3);

    state
        .settings()
        .update(ScoringSettingsUpdate {
            streak_threshold: Some(60.0),
            weights: None,
        })
        .expect("update threshold");

    let strict = state.scores().get_streaks(&ctx, day("2025-06-03")).expect("streaks");
    assert_eq!(strict.current_streak, 2);
    assert_eq!(strict.longest_streak, 2);
}

#[test]
fn test_history_is_most_recent_first() {
    let (state, ctx, _dir) = setup();
    let range = DateRange::new(day("2025-06-01"), day("2025-06-03")).expect("range");
    state.scores().recompute_range(&ctx, &range).expect("recompute range");

    let history = state
        .scores()
        .get_score_history(&ctx, &range)
        .expect("history");
    let dates: Vec<NaiveDate> = history.iter().map(|s| s.date).collect();
    assert_eq!(
        dates,
        vec![day("2025-06-03"), day("2025-06-02"), day("2025-06-01")]
    );
}
