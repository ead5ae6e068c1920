use crate::error::AppError;
use crate::models::context::RequestContext;
use crate::models::leaderboard::{
    LeaderboardMetric, LeaderboardRefreshResult, RankedLeaderboardEntry,
};

use super::scores::today;
use super::{run_blocking, AppState, CommandResult};

pub async fn leaderboard_fetch(
    state: &AppState,
    ctx: RequestContext,
    metric: String,
    limit: Option<usize>,
) -> CommandResult<Vec<RankedLeaderboardEntry>> {
    let app_state = state.clone();
    run_blocking(move || {
        let metric = LeaderboardMetric::try_from(metric.as_str()).map_err(|message| {
            AppError::validation_with_details(
                message,
                serde_json::json!({ "allowed": ["xp", "streak"] }),
            )
        })?;
        app_state.leaderboard().fetch(&ctx, metric, limit)
    })
    .await
}

/// Rebuilds the leaderboard from stored scores. Requires a signed-in caller.
pub async fn leaderboard_refresh(
    state: &AppState,
    ctx: RequestContext,
) -> CommandResult<LeaderboardRefreshResult> {
    let app_state = state.clone();
    run_blocking(move || {
        ctx.require_user()?;
        app_state.leaderboard().refresh(today())
    })
    .await
}
