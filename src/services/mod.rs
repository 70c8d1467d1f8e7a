pub mod leaderboard_service;
pub mod lock_ledger_service;
pub mod replenishment_service;
pub mod scoring_service;
pub mod season_service;

pub use leaderboard_service::*;
pub use lock_ledger_service::*;
pub use replenishment_service::*;
pub use scoring_service::*;
pub use season_service::*;
