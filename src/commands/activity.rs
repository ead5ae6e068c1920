use serde::Deserialize;

use crate::models::activity::{parse_date, ActivityEvent, ActivityMetrics, DateRange};
use crate::models::context::RequestContext;

use super::scores::today;
use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecordParams {
    #[serde(default)]
    pub date: Option<String>,
    pub event: ActivityEvent,
}

/// Applies one activity event to the caller's day and returns that day's
/// running totals.
pub async fn activity_record(
    state: &AppState,
    ctx: RequestContext,
    params: ActivityRecordParams,
) -> CommandResult<ActivityMetrics> {
    let app_state = state.clone();
    run_blocking(move || {
        let date = match params.date {
            Some(value) => parse_date(&value)?,
            None => today(),
        };
        app_state.activity().record(&ctx, date, params.event)
    })
    .await
}

pub async fn activity_metrics_fetch(
    state: &AppState,
    ctx: RequestContext,
    start_date: String,
    end_date: String,
) -> CommandResult<ActivityMetrics> {
    let app_state = state.clone();
    run_blocking(move || {
        let range = DateRange::parse(&start_date, &end_date)?;
        app_state.activity().get_activity_metrics(&ctx, &range)
    })
    .await
}
