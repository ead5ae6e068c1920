use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityMetrics;
use crate::models::score::{
    CategoryWeights, DailyScore, ScoreBreakdown, ScoreCategory, ScoreComputation,
};
use crate::models::settings::DEFAULT_WEIGHTS;

/// Score reported for a category with nothing scheduled or logged.
pub const NEUTRAL_SCORE: f64 = 100.0;
pub const NEUTRAL_MOMENTUM: f64 = 50.0;

pub const FOCUS_TARGET_MINUTES: f64 = 120.0;
pub const SLEEP_TARGET_MINUTES: f64 = 450.0;
pub const EXERCISE_TARGET_MINUTES: f64 = 30.0;
pub const TASK_OVERLOAD_THRESHOLD: f64 = 12.0;
pub const FOCUS_STRAIN_START_MINUTES: f64 = 360.0;
pub const FOCUS_STRAIN_SPAN_MINUTES: f64 = 240.0;

const TASK_COMPLETION_SHARE: f64 = 0.8;
const TASK_FOCUS_SHARE: f64 = 0.2;
const SLEEP_SHARE: f64 = 0.6;
const EXERCISE_SHARE: f64 = 0.4;

/// Per-category sub-scores and which categories had any data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryScores {
    pub habits: f64,
    pub tasks: f64,
    pub finance: f64,
    pub health: f64,
    pub with_data: Vec<ScoreCategory>,
}

impl CategoryScores {
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Habits => self.habits,
            ScoreCategory::Tasks => self.tasks,
            ScoreCategory::Finance => self.finance,
            ScoreCategory::Health => self.health,
        }
    }
}

/// Combines activity metrics into a weighted daily score.
#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    weights: CategoryWeights,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS)
    }
}

impl ScoreCalculator {
    pub fn new(weights: CategoryWeights) -> Self {
        Self { weights }
    }

    /// Computes the score for `date`. `prior_window` holds the scores of the
    /// days before `date` used for the momentum trend; entries dated on or
    /// after `date` are ignored.
    pub fn compute(
        &self,
        date: NaiveDate,
        metrics: &ActivityMetrics,
        prior_window: &[DailyScore],
    ) -> AppResult<ScoreComputation> {
        metrics.validate()?;

        let scores = self.category_scores(metrics);
        let applied_weights = self.applied_weights(&scores.with_data);
        let global_score = self.composite_score(&scores, &applied_weights)?;

        let prior: Vec<f64> = prior_window
            .iter()
            .filter(|score| score.date < date)
            .map(|score| score.global_score)
            .collect();
        let prior_window_average = if prior.is_empty() {
            None
        } else {
            Some(round2(prior.iter().sum::<f64>() / prior.len() as f64))
        };

        let momentum_index = momentum_index(global_score, prior_window_average);
        let burnout_index = burnout_index(metrics, momentum_index);

        Ok(ScoreComputation {
            score: DailyScore {
                date,
                global_score,
                habits_score: scores.habits,
                tasks_score: scores.tasks,
                finance_score: scores.finance,
                health_score: scores.health,
                momentum_index,
                burnout_index,
            },
            breakdown: ScoreBreakdown {
                applied_weights,
                categories_with_data: scores.with_data,
                prior_window_average,
            },
            metrics: *metrics,
        })
    }

    pub fn category_scores(&self, metrics: &ActivityMetrics) -> CategoryScores {
        let mut scores = CategoryScores::default();

        for category in ScoreCategory::ALL {
            let value = match category {
                ScoreCategory::Habits => habits_score(metrics),
                ScoreCategory::Tasks => tasks_score(metrics),
                ScoreCategory::Finance => finance_score(metrics),
                ScoreCategory::Health => health_score(metrics),
            };

            let score = match value {
                Some(value) => {
                    scores.with_data.push(category);
                    round2(value.clamp(0.0, 100.0))
                }
                None => NEUTRAL_SCORE,
            };

            match category {
                ScoreCategory::Habits => scores.habits = score,
                ScoreCategory::Tasks => scores.tasks = score,
                ScoreCategory::Finance => scores.finance = score,
                ScoreCategory::Health => scores.health = score,
            }
        }

        scores
    }

    /// Configured weights restricted to `with_data` and rescaled to sum to 1.
    pub fn applied_weights(&self, with_data: &[ScoreCategory]) -> CategoryWeights {
        let mut applied = CategoryWeights::default();
        for category in with_data {
            applied.set(*category, self.weights.get(*category).max(0.0));
        }

        let total = applied.sum();
        if total > 0.0 {
            for category in ScoreCategory::ALL {
                applied.set(category, applied.get(category) / total);
            }
        }

        applied
    }

    pub fn composite_score(
        &self,
        scores: &CategoryScores,
        weights: &CategoryWeights,
    ) -> AppResult<f64> {
        let composite: f64 = ScoreCategory::ALL
            .iter()
            .map(|category| scores.get(*category) * weights.get(*category))
            .sum();

        if !composite.is_finite() {
            return Err(AppError::compute_failure(format!(
                "composite score is not finite ({composite})"
            )));
        }

        Ok(round2(composite.clamp(0.0, 100.0)))
    }
}

/// Habit completion against scheduled occurrences. With nothing scheduled
/// the category has no data, whatever was tracked.
fn habits_score(metrics: &ActivityMetrics) -> Option<f64> {
    let habits = &metrics.habits;
    if habits.expected <= 0 {
        return None;
    }

    Some(habits.completed as f64 / habits.expected as f64 * 100.0)
}

fn tasks_score(metrics: &ActivityMetrics) -> Option<f64> {
    let tasks = &metrics.tasks;
    if tasks.total <= 0 && tasks.completed <= 0 && metrics.focus_minutes <= 0 {
        return None;
    }

    // Tasks created on earlier days can be completed today.
    let denominator = tasks.total.max(tasks.completed);
    let completion = if denominator > 0 {
        tasks.completed as f64 / denominator as f64
    } else {
        1.0
    };
    let focus = ratio(metrics.focus_minutes as f64, FOCUS_TARGET_MINUTES);

    Some((TASK_COMPLETION_SHARE * completion + TASK_FOCUS_SHARE * focus) * 100.0)
}

fn finance_score(metrics: &ActivityMetrics) -> Option<f64> {
    let finance = &metrics.finance;
    if finance.budget_cents <= 0 {
        return None;
    }

    if finance.spent_cents <= finance.budget_cents {
        return Some(100.0);
    }

    Some(finance.budget_cents as f64 / finance.spent_cents as f64 * 100.0)
}

fn health_score(metrics: &ActivityMetrics) -> Option<f64> {
    let health = &metrics.health;
    if health.sleep_minutes <= 0 && health.exercise_minutes <= 0 {
        return None;
    }

    let sleep = ratio(health.sleep_minutes as f64, SLEEP_TARGET_MINUTES);
    let exercise = ratio(health.exercise_minutes as f64, EXERCISE_TARGET_MINUTES);

    Some((SLEEP_SHARE * sleep + EXERCISE_SHARE * exercise) * 100.0)
}

/// 50 means flat against the prior window; each point of difference in the
/// global score moves the index by half a point.
pub fn momentum_index(global_score: f64, prior_window_average: Option<f64>) -> f64 {
    match prior_window_average {
        Some(average) => {
            let index = NEUTRAL_MOMENTUM + (global_score - average) / 2.0;
            round2(index.clamp(0.0, 100.0))
        }
        None => NEUTRAL_MOMENTUM,
    }
}

/// Overload signal from heavy, mostly unfinished task lists, long focus
/// days and a falling trend.
pub fn burnout_index(metrics: &ActivityMetrics, momentum_index: f64) -> f64 {
    let tasks = &metrics.tasks;
    let task_load = ratio(tasks.total as f64, TASK_OVERLOAD_THRESHOLD);
    let incompletion = if tasks.total > 0 {
        (1.0 - tasks.completed as f64 / tasks.total as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let focus_strain = ratio(
        (metrics.focus_minutes as f64 - FOCUS_STRAIN_START_MINUTES).max(0.0),
        FOCUS_STRAIN_SPAN_MINUTES,
    );
    let decline = (NEUTRAL_MOMENTUM - momentum_index).max(0.0) / NEUTRAL_MOMENTUM;

    let raw = 0.5 * task_load * incompletion + 0.3 * focus_strain + 0.2 * decline;
    round2((raw * 100.0).clamp(0.0, 100.0))
}

fn ratio(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (value / target).clamp(0.0, 1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
