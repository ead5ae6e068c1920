use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::db::store::AggregateStore;
use crate::error::{AppError, AppResult};
use crate::models::activity::{ActivityEvent, ActivityMetrics, DateRange};
use crate::models::context::RequestContext;
use crate::models::profile::UserProfileRecord;

/// Reads and records per-day activity counts for the authenticated user.
pub struct ActivityService {
    store: Arc<dyn AggregateStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn AggregateStore>) -> Self {
        Self { store }
    }

    /// Resolves the request's identity to a known profile.
    pub fn resolve_user(&self, ctx: &RequestContext) -> AppResult<UserProfileRecord> {
        let user = ctx.require_user()?;
        self.store
            .find_profile(&user.user_id)?
            .ok_or_else(AppError::unauthenticated)
    }

    /// Summed metrics for the range. Days without any recorded activity count
    /// as zero.
    pub fn get_activity_metrics(
        &self,
        ctx: &RequestContext,
        range: &DateRange,
    ) -> AppResult<ActivityMetrics> {
        let profile = self.resolve_user(ctx)?;
        self.metrics_for_user(&profile.user_id, range)
    }

    pub(crate) fn metrics_for_user(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> AppResult<ActivityMetrics> {
        match self.store.get_activity_metrics(user_id, range)? {
            Some(metrics) => Ok(metrics),
            None => {
                debug!(
                    target: "app::activity",
                    %user_id,
                    %range,
                    "no activity recorded, using zeroed metrics"
                );
                Ok(ActivityMetrics::default())
            }
        }
    }

    pub fn record(
        &self,
        ctx: &RequestContext,
        date: NaiveDate,
        event: ActivityEvent,
    ) -> AppResult<ActivityMetrics> {
        event.validate()?;
        let profile = self.resolve_user(ctx)?;

        self.store.record_activity(&profile.user_id, &date, &event)?;
        info!(
            target: "app::activity",
            user_id = %profile.user_id,
            %date,
            event = %event,
            "activity recorded"
        );

        self.metrics_for_user(&profile.user_id, &DateRange::single(date))
    }
}
