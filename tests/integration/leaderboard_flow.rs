use chrono::{Duration, NaiveDate};
use minded_core_lib::commands::AppState;
use minded_core_lib::db::DbPool;
use minded_core_lib::error::AppError;
use minded_core_lib::models::activity::{parse_date, ActivityEvent, DateRange};
use minded_core_lib::models::context::RequestContext;
use minded_core_lib::db::store::{AggregateStore, SqliteAggregateStore};
use minded_core_lib::models::leaderboard::{LeaderboardEntry, LeaderboardMetric};
use minded_core_lib::models::profile::UserProfileRecord;
use tempfile::tempdir;

struct Player {
    ctx: RequestContext,
    user_id: String,
}

fn setup() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("test.sqlite")).expect("db pool");
    let state = AppState::new(pool).expect("app state");
    (state, dir)
}

fn day(value: &str) -> NaiveDate {
    parse_date(value).expect("valid date")
}

/// Creates a player and scores `completions.len()` consecutive days ending on
/// `last_day`, each with four expected habits.
fn player_with_days(
    state: &AppState,
    name: &str,
    last_day: NaiveDate,
    completions: &[usize],
) -> Player {
    let profile = state.profiles().create(name).expect("create profile");
    let ctx = RequestContext::for_user(profile.user_id.clone());
    let first_day = last_day - Duration::days(completions.len() as i64 - 1);

    for (offset, completed) in completions.iter().enumerate() {
        let date = first_day + Duration::days(offset as i64);
        state
            .activity()
            .record(&ctx, date, ActivityEvent::HabitsExpected { count: 4 })
            .expect("expected habits");
        for _ in 0..*completed {
            state
                .activity()
                .record(&ctx, date, ActivityEvent::HabitCheckIn)
                .expect("check in");
        }
    }

    if !completions.is_empty() {
        let range = DateRange::new(first_day, last_day).expect("range");
        state.scores().recompute_range(&ctx, &range).expect("recompute range");
    }

    Player {
        ctx,
        user_id: profile.user_id,
    }
}

#[test]
fn test_refresh_ranks_by_xp_and_streak() {
    let (state, _dir) = setup();
    let today = day("2025-06-10");

    // 100 + 100 + 100 = 300 base, three qualifying days
    let steady = player_with_days(&state, "Steady", today, &[4, 4, 4]);
    // 100 + 0 = 100 base, one qualifying day, no current streak
    let lapsed = player_with_days(&state, "Lapsed", today, &[4, 0]);
    // 50 * 5 = 250 base, five qualifying days
    let grinder = player_with_days(&state, "Grinder", today, &[2, 2, 2, 2, 2]);

    let result = state.leaderboard().refresh(today).expect("refresh");
    assert_eq!(result.users_ranked, 3);

    let by_xp = state
        .leaderboard()
        .fetch(&steady.ctx, LeaderboardMetric::Xp, None)
        .expect("fetch xp");
    let xp: Vec<i64> = by_xp.iter().map(|row| row.entry.total_xp).collect();
    assert_eq!(xp, vec![330, 300, 110]);
    assert_eq!(by_xp[0].entry.user_id, steady.user_id);
    assert!(by_xp[0].is_current_user);
    assert!(by_xp[1..].iter().all(|row| !row.is_current_user));

    let by_streak = state
        .leaderboard()
        .fetch(&lapsed.ctx, LeaderboardMetric::Streak, None)
        .expect("fetch streak");
    let order: Vec<&str> = by_streak.iter().map(|row| row.entry.user_id.as_str()).collect();
    assert_eq!(
        order,
        vec![
            grinder.user_id.as_str(),
            steady.user_id.as_str(),
            lapsed.user_id.as_str()
        ]
    );
    let lapsed_row = by_streak.last().expect("lapsed row");
    assert_eq!(lapsed_row.entry.current_streak, 0);
    assert_eq!(lapsed_row.entry.longest_streak, 1);
    assert!(lapsed_row.is_current_user);

    let ranks: Vec<u32> = by_streak.iter().map(|row| row.entry.rank_streak).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn test_refresh_is_idempotent_and_replaces_rows() {
    let (state, _dir) = setup();
    let today = day("2025-06-10");
    let first = player_with_days(&state, "First", today, &[4]);
    let _second = player_with_days(&state, "Second", today, &[1]);

    state.leaderboard().refresh(today).expect("refresh");
    let before = state
        .leaderboard()
        .fetch(&first.ctx, LeaderboardMetric::Xp, None)
        .expect("fetch");

    state.leaderboard().refresh(today).expect("second refresh");
    let after = state
        .leaderboard()
        .fetch(&first.ctx, LeaderboardMetric::Xp, None)
        .expect("fetch");
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
}

#[test]
fn test_ties_get_unique_ranks_by_user_id() {
    let (state, _dir) = setup();
    let today = day("2025-06-10");
    let a = player_with_days(&state, "Twin A", today, &[4]);
    let b = player_with_days(&state, "Twin B", today, &[4]);

    state.leaderboard().refresh(today).expect("refresh");
    let rows = state
        .leaderboard()
        .fetch(&RequestContext::anonymous(), LeaderboardMetric::Xp, None)
        .expect("fetch");

    let mut expected = vec![a.user_id.clone(), b.user_id.clone()];
    expected.sort();
    let order: Vec<String> = rows.iter().map(|row| row.entry.user_id.clone()).collect();
    assert_eq!(order, expected);
    let ranks: Vec<u32> = rows.iter().map(|row| row.entry.rank_xp).collect();
    assert_eq!(ranks, vec![1, 2]);
    assert!(rows.iter().all(|row| !row.is_current_user));
}

#[test]
fn test_limit_and_unscored_users() {
    let (state, _dir) = setup();
    let today = day("2025-06-10");
    for name in ["One", "Two", "Three"] {
        player_with_days(&state, name, today, &[3]);
    }
    let idle = player_with_days(&state, "Idle", today, &[]);

    state.leaderboard().refresh(today).expect("refresh");

    let top_two = state
        .leaderboard()
        .fetch(&idle.ctx, LeaderboardMetric::Xp, Some(2))
        .expect("fetch");
    assert_eq!(top_two.len(), 2);

    let all = state
        .leaderboard()
        .fetch(&idle.ctx, LeaderboardMetric::Xp, None)
        .expect("fetch");
    let idle_row = all.iter().find(|row| row.is_current_user).expect("idle row");
    assert_eq!(idle_row.entry.total_xp, 0);
    assert_eq!(idle_row.entry.rank_xp, 4);

    let err = state
        .leaderboard()
        .fetch(&idle.ctx, LeaderboardMetric::Xp, Some(0))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

#[test]
fn test_empty_leaderboard_before_refresh() {
    let (state, _dir) = setup();
    let rows = state
        .leaderboard()
        .fetch(&RequestContext::anonymous(), LeaderboardMetric::Streak, None)
        .expect("fetch");
    assert!(rows.is_empty());
}

#[test]
fn test_limit_cuts_tied_ranks_by_metric_value() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("test.sqlite")).expect("db pool");
    let store = SqliteAggregateStore::new(pool.clone());
    let state = AppState::new(pool).expect("app state");

    // Lower user ids carry lower values, so an id-only tie-break would keep
    // the wrong rows.
    let rows = [("u-a", 10, 1), ("u-b", 30, 2), ("u-c", 50, 3)];
    let mut entries = Vec::new();
    for (user_id, xp, streak) in rows {
        store
            .insert_profile(&UserProfileRecord {
                user_id: user_id.to_string(),
                display_name: user_id.to_uppercase(),
                created_at: "2025-06-10T00:00:00Z".to_string(),
            })
            .expect("insert profile");
        entries.push(LeaderboardEntry {
            user_id: user_id.to_string(),
            display_name: user_id.to_uppercase(),
            total_xp: xp,
            current_streak: streak,
            longest_streak: streak,
            rank_xp: 1,
            rank_streak: 1,
        });
    }
    store.replace_leaderboard(&entries).expect("replace leaderboard");

    let by_xp = state
        .leaderboard()
        .fetch(&RequestContext::for_user("u-b"), LeaderboardMetric::Xp, Some(2))
        .expect("fetch xp");
    let order: Vec<&str> = by_xp.iter().map(|row| row.entry.user_id.as_str()).collect();
    assert_eq!(order, vec!["u-c", "u-b"]);
    assert!(by_xp[1].is_current_user);

    let by_streak = state
        .leaderboard()
        .fetch(&RequestContext::anonymous(), LeaderboardMetric::Streak, Some(1))
        .expect("fetch streak");
    assert_eq!(by_streak[0].entry.user_id, "u-c");
}
