use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::models::activity::{parse_date, DateRange};
use crate::models::context::RequestContext;
use crate::models::score::{RecomputeResponse, ScoreHistoryResponse};
use crate::models::streak::StreakState;

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryParams {
    pub start_date: String,
    pub end_date: String,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn resolve_date(date: Option<String>) -> crate::error::AppResult<NaiveDate> {
    match date {
        Some(value) => parse_date(&value),
        None => Ok(today()),
    }
}

/// Recomputes and stores the caller's score for `date` (today when omitted).
pub async fn scores_recompute(
    state: &AppState,
    ctx: RequestContext,
    date: Option<String>,
) -> CommandResult<RecomputeResponse> {
    let app_state = state.clone();
    run_blocking(move || {
        let target = resolve_date(date)?;
        let computation = app_state.scores().recompute(&ctx, target)?;
        Ok(RecomputeResponse::from(computation))
    })
    .await
}

pub async fn scores_history_fetch(
    state: &AppState,
    ctx: RequestContext,
    params: ScoreHistoryParams,
) -> CommandResult<ScoreHistoryResponse> {
    let app_state = state.clone();
    run_blocking(move || {
        let range = DateRange::parse(&params.start_date, &params.end_date)?;
        let scores = app_state.scores().get_score_history(&ctx, &range)?;
        let total_scores = scores.len();

        Ok(ScoreHistoryResponse {
            scores,
            start_date: range.from,
            end_date: range.to,
            total_scores,
        })
    })
    .await
}

pub async fn streaks_fetch(
    state: &AppState,
    ctx: RequestContext,
    today_override: Option<String>,
) -> CommandResult<StreakState> {
    let app_state = state.clone();
    run_blocking(move || {
        let anchor = resolve_date(today_override)?;
        app_state.scores().get_streaks(&ctx, anchor)
    })
    .await
}
