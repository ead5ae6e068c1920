//! Aggregate store abstraction used by the scoring services.
//!
//! Services depend on [`AggregateStore`] rather than on SQLite directly so the
//! pipeline can be exercised against any backing store.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::db::repositories::activity_repository::{ActivityDelta, ActivityRepository};
use crate::db::repositories::daily_score_repository::DailyScoreRepository;
use crate::db::repositories::leaderboard_repository::LeaderboardRepository;
use crate::db::repositories::profile_repository::ProfileRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::activity::{ActivityEvent, ActivityMetrics, DateRange};
use crate::models::leaderboard::{LeaderboardEntry, LeaderboardMetric};
use crate::models::profile::UserProfileRecord;
use crate::models::score::DailyScore;

pub trait AggregateStore: Send + Sync {
    /// Summed activity for the range; `None` when nothing was recorded.
    fn get_activity_metrics(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Option<ActivityMetrics>>;

    fn record_activity(
        &self,
        user_id: &str,
        date: &NaiveDate,
        event: &ActivityEvent,
    ) -> AppResult<()>;

    fn upsert_daily_score(&self, user_id: &str, score: &DailyScore) -> AppResult<()>;

    /// Scores in the inclusive range, most recent first.
    fn get_score_history(&self, user_id: &str, range: &DateRange) -> AppResult<Vec<DailyScore>>;

    /// Every stored score for the user, most recent first.
    fn get_full_score_history(&self, user_id: &str) -> AppResult<Vec<DailyScore>>;

    fn delete_scores_before(&self, user_id: &str, cutoff: &NaiveDate) -> AppResult<usize>;

    fn get_leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>>;

    fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> AppResult<()>;

    fn find_profile(&self, user_id: &str) -> AppResult<Option<UserProfileRecord>>;

    fn insert_profile(&self, profile: &UserProfileRecord) -> AppResult<()>;

    fn list_profiles(&self) -> AppResult<Vec<UserProfileRecord>>;
}

#[derive(Clone, Debug)]
pub struct SqliteAggregateStore {
    db: DbPool,
}

impl SqliteAggregateStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl AggregateStore for SqliteAggregateStore {
    fn get_activity_metrics(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<Option<ActivityMetrics>> {
        self.db
            .with_connection(|conn| ActivityRepository::sum_range(conn, user_id, range))
    }

    fn record_activity(
        &self,
        user_id: &str,
        date: &NaiveDate,
        event: &ActivityEvent,
    ) -> AppResult<()> {
        let delta = ActivityDelta::from(*event);
        self.db
            .with_connection(|conn| ActivityRepository::apply_delta(conn, user_id, date, &delta))
    }

    fn upsert_daily_score(&self, user_id: &str, score: &DailyScore) -> AppResult<()> {
        self.db
            .with_connection(|conn| DailyScoreRepository::upsert(conn, user_id, score))
    }

    fn get_score_history(&self, user_id: &str, range: &DateRange) -> AppResult<Vec<DailyScore>> {
        self.db
            .with_connection(|conn| DailyScoreRepository::list_range(conn, user_id, range))
    }

    fn get_full_score_history(&self, user_id: &str) -> AppResult<Vec<DailyScore>> {
        self.db
            .with_connection(|conn| DailyScoreRepository::list_all_for_user(conn, user_id))
    }

    fn delete_scores_before(&self, user_id: &str, cutoff: &NaiveDate) -> AppResult<usize> {
        self.db
            .with_connection(|conn| DailyScoreRepository::delete_before(conn, user_id, cutoff))
    }

    fn get_leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: usize,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        self.db
            .with_connection(|conn| LeaderboardRepository::list_by_metric(conn, metric, limit))
    }

    fn replace_leaderboard(&self, entries: &[LeaderboardEntry]) -> AppResult<()> {
        let refreshed_at = Utc::now().to_rfc3339();
        self.db.with_transaction(|conn| {
            LeaderboardRepository::replace_all(conn, entries, &refreshed_at)
        })?;
        debug!(target: "app::db", entries = entries.len(), "leaderboard table replaced");
        Ok(())
    }

    fn find_profile(&self, user_id: &str) -> AppResult<Option<UserProfileRecord>> {
        self.db
            .with_connection(|conn| ProfileRepository::find_by_id(conn, user_id))
    }

    fn insert_profile(&self, profile: &UserProfileRecord) -> AppResult<()> {
        self.db
            .with_connection(|conn| ProfileRepository::insert(conn, profile))
    }

    fn list_profiles(&self) -> AppResult<Vec<UserProfileRecord>> {
        self.db.with_connection(ProfileRepository::list_all)
    }
}
