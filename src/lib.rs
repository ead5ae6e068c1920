pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::path::Path;

use tracing::info;

use crate::commands::AppState;
use crate::db::DbPool;
use crate::error::AppResult;

pub const DATABASE_FILE_NAME: &str = "minded.sqlite";

/// Opens (and migrates) the database under `data_dir` and wires every
/// service. Call [`init_logging`](utils::logger::init_logging) first if logs
/// should reach a file.
pub fn bootstrap(data_dir: &Path) -> AppResult<AppState> {
    std::fs::create_dir_all(data_dir)?;

    let pool = DbPool::new(data_dir.join(DATABASE_FILE_NAME))?;
    info!(target: "app::db", path = %pool.path().display(), "database ready");

    AppState::new(pool)
}

/// Like [`bootstrap`], with logging written to `data_dir/logs`.
pub fn bootstrap_with_logging(data_dir: &Path) -> AppResult<AppState> {
    utils::logger::init_logging(&data_dir.join("logs"))?;
    bootstrap(data_dir)
}
