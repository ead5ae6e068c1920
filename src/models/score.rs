use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityMetrics;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Habits,
    Tasks,
    Finance,
    Health,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 4] = [
        ScoreCategory::Habits,
        ScoreCategory::Tasks,
        ScoreCategory::Finance,
        ScoreCategory::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Habits => "habits",
            ScoreCategory::Tasks => "tasks",
            ScoreCategory::Finance => "finance",
            ScoreCategory::Health => "health",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite score for one user on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyScore {
    pub date: NaiveDate,
    pub global_score: f64,
    pub habits_score: f64,
    pub tasks_score: f64,
    pub finance_score: f64,
    pub health_score: f64,
    pub momentum_index: f64,
    pub burnout_index: f64,
}

/// Weights actually applied to each category after dropping categories
/// without data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWeights {
    pub habits: f64,
    pub tasks: f64,
    pub finance: f64,
    pub health: f64,
}

impl CategoryWeights {
    pub fn get(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Habits => self.habits,
            ScoreCategory::Tasks => self.tasks,
            ScoreCategory::Finance => self.finance,
            ScoreCategory::Health => self.health,
        }
    }

    pub fn set(&mut self, category: ScoreCategory, value: f64) {
        match category {
            ScoreCategory::Habits => self.habits = value,
            ScoreCategory::Tasks => self.tasks = value,
            ScoreCategory::Finance => self.finance = value,
            ScoreCategory::Health => self.health = value,
        }
    }

    pub fn sum(&self) -> f64 {
        self.habits + self.tasks + self.finance + self.health
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub applied_weights: CategoryWeights,
    pub categories_with_data: Vec<ScoreCategory>,
    pub prior_window_average: Option<f64>,
}

/// Output of one score computation before it is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComputation {
    pub score: DailyScore,
    pub breakdown: ScoreBreakdown,
    pub metrics: ActivityMetrics,
}

/// Payload returned by the recompute trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecomputeResponse {
    pub success: bool,
    pub score: DailyScore,
    pub breakdown: ScoreBreakdown,
    pub metrics: ActivityMetrics,
    pub momentum_index: f64,
    pub burnout_index: f64,
}

impl From<ScoreComputation> for RecomputeResponse {
    fn from(computation: ScoreComputation) -> Self {
        let momentum_index = computation.score.momentum_index;
        let burnout_index = computation.score.burnout_index;
        Self {
            success: true,
            score: computation.score,
            breakdown: computation.breakdown,
            metrics: computation.metrics,
            momentum_index,
            burnout_index,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryResponse {
    pub scores: Vec<DailyScore>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_scores: usize,
}
