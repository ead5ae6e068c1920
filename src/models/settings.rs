use serde::{Deserialize, Serialize};

use crate::models::score::CategoryWeights;

pub const DEFAULT_STREAK_THRESHOLD: f64 = 30.0;
pub const DEFAULT_WEIGHTS: CategoryWeights = CategoryWeights {
    habits: 0.35,
    tasks: 0.35,
    finance: 0.15,
    health: 0.15,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSettings {
    pub streak_threshold: f64,
    pub weights: CategoryWeights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            streak_threshold: DEFAULT_STREAK_THRESHOLD,
            weights: DEFAULT_WEIGHTS,
            updated_at: None,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSettingsUpdate {
    pub streak_threshold: Option<f64>,
    pub weights: Option<CategoryWeights>,
}
