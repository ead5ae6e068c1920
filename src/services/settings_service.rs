use std::sync::RwLock;

use tracing::{info, warn};

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::score::{CategoryWeights, ScoreCategory};
use crate::models::settings::{ScoringSettings, ScoringSettingsUpdate};

const KEY_STREAK_THRESHOLD: &str = "scoring.streak_threshold";
const KEY_CATEGORY_WEIGHTS: &str = "scoring.category_weights";

const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Scoring configuration persisted in `app_settings`, cached after the
/// first read.
pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<ScoringSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<ScoringSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: ScoringSettingsUpdate) -> AppResult<ScoringSettings> {
        let mut current = self.get()?;

        if let Some(threshold) = input.streak_threshold {
            ensure_valid_threshold(threshold)?;
            current.streak_threshold = threshold;
        }

        if let Some(weights) = input.weights {
            ensure_valid_weights(&weights)?;
            current.weights = weights;
        }

        self.db.with_transaction(|conn| {
            if input.streak_threshold.is_some() {
                SettingsRepository::upsert(
                    conn,
                    KEY_STREAK_THRESHOLD,
                    &current.streak_threshold.to_string(),
                )?;
            }
            if input.weights.is_some() {
                SettingsRepository::upsert(
                    conn,
                    KEY_CATEGORY_WEIGHTS,
                    &serde_json::to_string(&current.weights)?,
                )?;
            }
            Ok(())
        })?;

        // Reload so `updated_at` reflects the stored rows.
        let refreshed = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(refreshed.clone());
        }

        info!(
            target: "app::settings",
            threshold = refreshed.streak_threshold,
            "scoring settings updated"
        );

        Ok(refreshed)
    }

    fn load_settings_from_db(&self) -> AppResult<ScoringSettings> {
        self.db.with_connection(|conn| {
            let mut settings = ScoringSettings::default();
            let mut latest_updated_at: Option<String> = None;

            if let Some(row) = SettingsRepository::get(conn, KEY_STREAK_THRESHOLD)? {
                match row.value.parse::<f64>() {
                    Ok(value) if ensure_valid_threshold(value).is_ok() => {
                        settings.streak_threshold = value;
                    }
                    _ => warn!(
                        target: "app::settings",
                        value = %row.value,
                        "ignoring invalid stored streak threshold"
                    ),
                }
                latest_updated_at = Some(row.updated_at);
            }

            if let Some(row) = SettingsRepository::get(conn, KEY_CATEGORY_WEIGHTS)? {
                match serde_json::from_str::<CategoryWeights>(&row.value) {
                    Ok(weights) if ensure_valid_weights(&weights).is_ok() => {
                        settings.weights = weights;
                    }
                    _ => warn!(
                        target: "app::settings",
                        value = %row.value,
                        "ignoring invalid stored category weights"
                    ),
                }
                latest_updated_at = match latest_updated_at {
                    Some(current) if current >= row.updated_at => Some(current),
                    _ => Some(row.updated_at),
                };
            }

            settings.updated_at = latest_updated_at;
            Ok(settings)
        })
    }
}

fn ensure_valid_threshold(threshold: f64) -> AppResult<()> {
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return Err(AppError::validation(format!(
            "streak threshold must be between 0 and 100, got {threshold}"
        )));
    }
    Ok(())
}

fn ensure_valid_weights(weights: &CategoryWeights) -> AppResult<()> {
    if let Some(category) = ScoreCategory::ALL
        .iter()
        .find(|category| !weights.get(**category).is_finite() || weights.get(**category) < 0.0)
    {
        return Err(AppError::validation(format!(
            "weight for {category} must be a non-negative number"
        )));
    }

    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(AppError::validation_with_details(
            format!("category weights must sum to 1.0, got {sum:.3}"),
            serde_json::to_value(weights)?,
        ));
    }

    Ok(())
}
