pub mod activity;
pub mod leaderboard;
pub mod profiles;
pub mod scores;
pub mod settings;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, warn};

use crate::db::store::{AggregateStore, SqliteAggregateStore};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::activity_service::ActivityService;
use crate::services::daily_score_service::DailyScoreService;
use crate::services::leaderboard_service::LeaderboardService;
use crate::services::profile_service::ProfileService;
use crate::services::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    activity_service: Arc<ActivityService>,
    daily_score_service: Arc<DailyScoreService>,
    leaderboard_service: Arc<LeaderboardService>,
    profile_service: Arc<ProfileService>,
    settings_service: Arc<SettingsService>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let store: Arc<dyn AggregateStore> = Arc::new(SqliteAggregateStore::new(db_pool.clone()));
        Ok(Self::with_store(db_pool, store))
    }

    /// Builds the services on top of an arbitrary aggregate store. Settings
    /// always live in `db_pool`.
    pub fn with_store(db_pool: DbPool, store: Arc<dyn AggregateStore>) -> Self {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let activity_service = Arc::new(ActivityService::new(Arc::clone(&store)));
        let daily_score_service = Arc::new(DailyScoreService::new(
            Arc::clone(&store),
            Arc::clone(&activity_service),
            Arc::clone(&settings_service),
        ));
        let leaderboard_service = Arc::new(LeaderboardService::new(
            Arc::clone(&store),
            Arc::clone(&settings_service),
        ));
        let profile_service = Arc::new(ProfileService::new(store));

        Self {
            activity_service,
            daily_score_service,
            leaderboard_service,
            profile_service,
            settings_service,
        }
    }

    pub fn activity(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activity_service)
    }

    pub fn scores(&self) -> Arc<DailyScoreService> {
        Arc::clone(&self.daily_score_service)
    }

    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard_service)
    }

    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profile_service)
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Tagged failure returned to remote callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        let retry_hint = error
            .is_retryable()
            .then(|| serde_json::json!({ "retryable": true }));

        match error {
            AppError::Unauthenticated => {
                CommandError::new("UNAUTHENTICATED", "sign in to continue", None)
            }
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "the requested resource does not exist", None)
            }
            AppError::ComputeFailure { message } => {
                warn!(target: "app::command", %message, "compute failure in command");
                CommandError::new("COMPUTE_FAILURE", message, None)
            }
            AppError::Validation { message, details } => {
                CommandError::new("VALIDATION_ERROR", message, details)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, retry_hint)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "serialization failed", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", retry_hint)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}

/// Runs blocking store work off the async executor.
pub(crate) async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| {
            CommandError::new("UNKNOWN", format!("background task failed: {err}"), None)
        })?
        .map_err(CommandError::from)
}
