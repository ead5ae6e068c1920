pub mod activity_service;
pub mod daily_score_service;
pub mod leaderboard_service;
pub mod profile_service;
pub mod score_calculator;
pub mod settings_service;
pub mod streak_evaluator;
