use crate::models::profile::{UserProfileCreate, UserProfileRecord};

use super::{run_blocking, AppState, CommandResult};

pub async fn profiles_create(
    state: &AppState,
    payload: UserProfileCreate,
) -> CommandResult<UserProfileRecord> {
    let app_state = state.clone();
    run_blocking(move || app_state.profiles().create(&payload.display_name)).await
}

pub async fn profiles_get(state: &AppState, user_id: String) -> CommandResult<UserProfileRecord> {
    let app_state = state.clone();
    run_blocking(move || app_state.profiles().find(&user_id)).await
}
