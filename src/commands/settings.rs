use crate::models::context::RequestContext;
use crate::models::settings::{ScoringSettings, ScoringSettingsUpdate};

use super::{run_blocking, AppState, CommandResult};

pub async fn settings_get(state: &AppState) -> CommandResult<ScoringSettings> {
    let app_state = state.clone();
    run_blocking(move || app_state.settings().get()).await
}

pub async fn settings_update(
    state: &AppState,
    ctx: RequestContext,
    payload: ScoringSettingsUpdate,
) -> CommandResult<ScoringSettings> {
    let app_state = state.clone();
    run_blocking(move || {
        ctx.require_user()?;
        app_state.settings().update(payload)
    })
    .await
}
