pub mod leaderboard;
pub mod locks;
pub mod scoring;
pub mod seasons;

pub use leaderboard::leaderboard_config;
pub use locks::locks_config;
pub use scoring::scoring_config;
pub use seasons::seasons_config;
