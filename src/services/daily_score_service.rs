use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{error, info};

use crate::db::store::AggregateStore;
use crate::error::AppResult;
use crate::models::activity::DateRange;
use crate::models::context::RequestContext;
use crate::models::score::{DailyScore, ScoreComputation};
use crate::models::streak::StreakState;
use crate::services::activity_service::ActivityService;
use crate::services::score_calculator::ScoreCalculator;
use crate::services::settings_service::SettingsService;
use crate::services::streak_evaluator::StreakEvaluator;

/// Days before the scored day that feed the momentum trend.
pub const MOMENTUM_WINDOW_DAYS: i64 = 7;

/// Computes, persists and queries daily scores and streaks.
pub struct DailyScoreService {
    store: Arc<dyn AggregateStore>,
    activity: Arc<ActivityService>,
    settings: Arc<SettingsService>,
}

impl DailyScoreService {
    pub fn new(
        store: Arc<dyn AggregateStore>,
        activity: Arc<ActivityService>,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            store,
            activity,
            settings,
        }
    }

    /// Recomputes the score for `date` from the recorded activity and
    /// overwrites any stored score for that day.
    pub fn recompute(&self, ctx: &RequestContext, date: NaiveDate) -> AppResult<ScoreComputation> {
        let profile = self.activity.resolve_user(ctx)?;
        self.recompute_for_user(&profile.user_id, date)
    }

    fn recompute_for_user(&self, user_id: &str, date: NaiveDate) -> AppResult<ScoreComputation> {
        let settings = self.settings.get()?;
        let metrics = self
            .activity
            .metrics_for_user(user_id, &DateRange::single(date))?;

        let prior_window = match DateRange::trailing(date, MOMENTUM_WINDOW_DAYS) {
            Some(range) => self.store.get_score_history(user_id, &range)?,
            None => Vec::new(),
        };

        let calculator = ScoreCalculator::new(settings.weights);
        let computation = calculator.compute(date, &metrics, &prior_window)?;

        self.store.upsert_daily_score(user_id, &computation.score)?;

        info!(
            target: "app::score",
            %user_id,
            %date,
            global_score = computation.score.global_score,
            momentum = computation.score.momentum_index,
            burnout = computation.score.burnout_index,
            "daily score recomputed"
        );

        Ok(computation)
    }

    /// Recomputes every day of the range oldest first, so each day's momentum
    /// sees the freshly computed days before it. Stops at the first failing
    /// day; days before it stay persisted.
    pub fn recompute_range(
        &self,
        ctx: &RequestContext,
        range: &DateRange,
    ) -> AppResult<Vec<DailyScore>> {
        let profile = self.activity.resolve_user(ctx)?;
        let mut results = Vec::with_capacity(range.num_days() as usize);

        let mut day = range.from;
        while day <= range.to {
            let computation = self
                .recompute_for_user(&profile.user_id, day)
                .map_err(|err| {
                    error!(target: "app::score", %day, error = %err, "failed to recompute score");
                    err
                })?;
            results.push(computation.score);
            day = day + Duration::days(1);
        }

        Ok(results)
    }

    pub fn get_score(
        &self,
        ctx: &RequestContext,
        date: NaiveDate,
    ) -> AppResult<Option<DailyScore>> {
        let profile = self.activity.resolve_user(ctx)?;
        let mut scores = self
            .store
            .get_score_history(&profile.user_id, &DateRange::single(date))?;
        Ok(scores.pop())
    }

    /// Stored scores in the range, most recent first.
    pub fn get_score_history(
        &self,
        ctx: &RequestContext,
        range: &DateRange,
    ) -> AppResult<Vec<DailyScore>> {
        let profile = self.activity.resolve_user(ctx)?;
        self.store.get_score_history(&profile.user_id, range)
    }

    pub fn get_streaks(&self, ctx: &RequestContext, today: NaiveDate) -> AppResult<StreakState> {
        let profile = self.activity.resolve_user(ctx)?;
        let settings = self.settings.get()?;
        let history = self.store.get_full_score_history(&profile.user_id)?;

        StreakEvaluator::new(settings.streak_threshold).evaluate(&history, today)
    }

    /// Deletes stored scores dated before `cutoff`; returns how many went.
    pub fn purge_before(&self, ctx: &RequestContext, cutoff: NaiveDate) -> AppResult<usize> {
        let profile = self.activity.resolve_user(ctx)?;
        let deleted = self.store.delete_scores_before(&profile.user_id, &cutoff)?;
        info!(
            target: "app::score",
            user_id = %profile.user_id,
            %cutoff,
            deleted,
            "old scores purged"
        );
        Ok(deleted)
    }
}
