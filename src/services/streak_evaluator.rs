use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::score::DailyScore;
use crate::models::settings::DEFAULT_STREAK_THRESHOLD;
use crate::models::streak::StreakState;

/// Counts runs of consecutive days whose global score reaches a threshold.
#[derive(Debug, Clone, Copy)]
pub struct StreakEvaluator {
    threshold: f64,
}

impl Default for StreakEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_STREAK_THRESHOLD)
    }
}

impl StreakEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn qualifies(&self, score: &DailyScore) -> bool {
        score.global_score >= self.threshold
    }

    /// `history` must be ordered by date, most recent first, with at most
    /// one record per day.
    ///
    /// The current streak is anchored on `today` when today already has a
    /// record and on yesterday otherwise, since the current day may not be
    /// scored yet.
    pub fn evaluate(&self, history: &[DailyScore], today: NaiveDate) -> AppResult<StreakState> {
        ensure_descending(history)?;

        let Some(latest) = history.first() else {
            return Ok(StreakState::default());
        };

        let anchor = if latest.date >= today {
            today
        } else {
            today - Duration::days(1)
        };

        let state = StreakState {
            current_streak: self.current_streak(history, anchor),
            longest_streak: self.longest_streak(history),
        };

        debug!(
            target: "app::streak",
            current = state.current_streak,
            longest = state.longest_streak,
            records = history.len(),
            threshold = self.threshold,
            "streaks evaluated"
        );

        Ok(state)
    }

    fn current_streak(&self, history: &[DailyScore], anchor: NaiveDate) -> u32 {
        let mut expected = anchor;
        let mut streak = 0;

        for score in history.iter().skip_while(|score| score.date > anchor) {
            if score.date != expected || !self.qualifies(score) {
                break;
            }
            streak += 1;
            expected = expected - Duration::days(1);
        }

        streak
    }

    fn longest_streak(&self, history: &[DailyScore]) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;

        for score in history {
            if !self.qualifies(score) {
                run = 0;
                previous = None;
                continue;
            }

            run = match previous {
                Some(day) if day - Duration::days(1) == score.date => run + 1,
                _ => 1,
            };
            previous = Some(score.date);
            longest = longest.max(run);
        }

        longest
    }
}

fn ensure_descending(history: &[DailyScore]) -> AppResult<()> {
    if let Some(pair) = history.windows(2).find(|pair| pair[0].date <= pair[1].date) {
        return Err(AppError::compute_failure(format!(
            "score history must be strictly descending by date ({} then {})",
            pair[0].date, pair[1].date
        )));
    }
    Ok(())
}
