pub mod activity;
pub mod context;
pub mod leaderboard;
pub mod profile;
pub mod score;
pub mod settings;
pub mod streak;
