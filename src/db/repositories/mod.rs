pub mod activity_repository;
pub mod daily_score_repository;
pub mod leaderboard_repository;
pub mod profile_repository;
pub mod settings_repository;
