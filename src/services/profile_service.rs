use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::store::AggregateStore;
use crate::error::{AppError, AppResult};
use crate::models::profile::UserProfileRecord;

const MAX_DISPLAY_NAME_CHARS: usize = 64;

pub struct ProfileService {
    store: Arc<dyn AggregateStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn AggregateStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, display_name: &str) -> AppResult<UserProfileRecord> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::validation("display name must not be empty"));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(AppError::validation(format!(
                "display name must be at most {MAX_DISPLAY_NAME_CHARS} characters"
            )));
        }

        let record = UserProfileRecord {
            user_id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.store.insert_profile(&record)?;

        info!(target: "app::profile", user_id = %record.user_id, "profile created");
        Ok(record)
    }

    pub fn find(&self, user_id: &str) -> AppResult<UserProfileRecord> {
        self.store
            .find_profile(user_id)?
            .ok_or_else(AppError::not_found)
    }
}
