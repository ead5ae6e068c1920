use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    Xp,
    Streak,
}

impl LeaderboardMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardMetric::Xp => "xp",
            LeaderboardMetric::Streak => "streak",
        }
    }

    pub(crate) fn rank_column(&self) -> &'static str {
        match self {
            LeaderboardMetric::Xp => "rank_xp",
            LeaderboardMetric::Streak => "rank_streak",
        }
    }

    pub(crate) fn value_column(&self) -> &'static str {
        match self {
            LeaderboardMetric::Xp => "total_xp",
            LeaderboardMetric::Streak => "current_streak",
        }
    }
}

impl fmt::Display for LeaderboardMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LeaderboardMetric {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "xp" => Ok(LeaderboardMetric::Xp),
            "streak" => Ok(LeaderboardMetric::Streak),
            other => Err(format!("unsupported leaderboard metric: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub total_xp: i64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub rank_xp: u32,
    pub rank_streak: u32,
}

impl LeaderboardEntry {
    pub fn rank(&self, metric: LeaderboardMetric) -> u32 {
        match metric {
            LeaderboardMetric::Xp => self.rank_xp,
            LeaderboardMetric::Streak => self.rank_streak,
        }
    }

    pub fn metric_value(&self, metric: LeaderboardMetric) -> i64 {
        match metric {
            LeaderboardMetric::Xp => self.total_xp,
            LeaderboardMetric::Streak => i64::from(self.current_streak),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedLeaderboardEntry {
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRefreshResult {
    pub users_ranked: usize,
    pub refreshed_at: String,
}
