use std::cmp::{Ordering, Reverse};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::db::store::AggregateStore;
use crate::error::{AppError, AppResult};
use crate::models::context::RequestContext;
use crate::models::leaderboard::{
    LeaderboardEntry, LeaderboardMetric, LeaderboardRefreshResult, RankedLeaderboardEntry,
};
use crate::models::score::DailyScore;
use crate::services::settings_service::SettingsService;
use crate::services::streak_evaluator::StreakEvaluator;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
pub const MAX_LEADERBOARD_LIMIT: usize = 500;
/// Extra XP for every day that reached the streak threshold.
pub const QUALIFYING_DAY_BONUS_XP: i64 = 10;

/// Orders by the precomputed rank column, then by metric value descending,
/// then by user id.
fn compare_entries(
    metric: LeaderboardMetric,
    a: &LeaderboardEntry,
    b: &LeaderboardEntry,
) -> Ordering {
    a.rank(metric)
        .cmp(&b.rank(metric))
        .then_with(|| Reverse(a.metric_value(metric)).cmp(&Reverse(b.metric_value(metric))))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Sorts `entries` for display and flags the caller's own row.
pub fn rank_entries(
    mut entries: Vec<LeaderboardEntry>,
    metric: LeaderboardMetric,
    current_user_id: Option<&str>,
) -> Vec<RankedLeaderboardEntry> {
    entries.sort_by(|a, b| compare_entries(metric, a, b));

    entries
        .into_iter()
        .map(|entry| {
            let is_current_user = current_user_id.is_some_and(|id| id == entry.user_id);
            RankedLeaderboardEntry {
                entry,
                is_current_user,
            }
        })
        .collect()
}

/// Fills `rank_xp` and `rank_streak` with 1-based positions. Equal values
/// are separated by user id so every rank is unique.
pub fn assign_ranks(entries: &mut [LeaderboardEntry]) {
    for metric in [LeaderboardMetric::Xp, LeaderboardMetric::Streak] {
        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by(|&a, &b| {
            Reverse(entries[a].metric_value(metric))
                .cmp(&Reverse(entries[b].metric_value(metric)))
                .then_with(|| entries[a].user_id.cmp(&entries[b].user_id))
        });

        for (position, index) in order.into_iter().enumerate() {
            let rank = position as u32 + 1;
            match metric {
                LeaderboardMetric::Xp => entries[index].rank_xp = rank,
                LeaderboardMetric::Streak => entries[index].rank_streak = rank,
            }
        }
    }
}

/// XP earned from a score history: rounded global score per day plus a bonus
/// for each qualifying day.
pub fn total_xp(history: &[DailyScore], evaluator: &StreakEvaluator) -> i64 {
    history
        .iter()
        .map(|score| {
            let bonus = if evaluator.qualifies(score) {
                QUALIFYING_DAY_BONUS_XP
            } else {
                0
            };
            score.global_score.round() as i64 + bonus
        })
        .sum()
}

pub struct LeaderboardService {
    store: Arc<dyn AggregateStore>,
    settings: Arc<SettingsService>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn AggregateStore>, settings: Arc<SettingsService>) -> Self {
        Self { store, settings }
    }

    /// Top entries for `metric`. The caller's row is flagged when the
    /// context carries an identity; anonymous callers get the plain list.
    pub fn fetch(
        &self,
        ctx: &RequestContext,
        metric: LeaderboardMetric,
        limit: Option<usize>,
    ) -> AppResult<Vec<RankedLeaderboardEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        if limit == 0 || limit > MAX_LEADERBOARD_LIMIT {
            return Err(AppError::validation(format!(
                "leaderboard limit must be between 1 and {MAX_LEADERBOARD_LIMIT}"
            )));
        }

        let entries = self.store.get_leaderboard(metric, limit)?;
        let current_user_id = ctx.user().map(|user| user.user_id.as_str());
        Ok(rank_entries(entries, metric, current_user_id))
    }

    /// Rebuilds every leaderboard row from the stored daily scores.
    pub fn refresh(&self, today: NaiveDate) -> AppResult<LeaderboardRefreshResult> {
        let settings = self.settings.get()?;
        let evaluator = StreakEvaluator::new(settings.streak_threshold);
        let profiles = self.store.list_profiles()?;

        let mut entries = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let history = self.store.get_full_score_history(&profile.user_id)?;
            let streaks = match evaluator.evaluate(&history, today) {
                Ok(streaks) => streaks,
                Err(err) => {
                    warn!(
                        target: "app::leaderboard",
                        user_id = %profile.user_id,
                        error = %err,
                        "skipping user with unusable score history"
                    );
                    continue;
                }
            };

            entries.push(LeaderboardEntry {
                total_xp: total_xp(&history, &evaluator),
                current_streak: streaks.current_streak,
                longest_streak: streaks.longest_streak,
                rank_xp: 0,
                rank_streak: 0,
                user_id: profile.user_id,
                display_name: profile.display_name,
            });
        }

        assign_ranks(&mut entries);
        self.store.replace_leaderboard(&entries)?;

        info!(target: "app::leaderboard", users = entries.len(), %today, "leaderboard refreshed");

        Ok(LeaderboardRefreshResult {
            users_ranked: entries.len(),
            refreshed_at: Utc::now().to_rfc3339(),
        })
    }
}
