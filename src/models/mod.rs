pub mod common;
pub mod leaderboard;
pub mod lock;
pub mod pagination;
pub mod scoring;
pub mod season;

pub use common::*;
pub use leaderboard::*;
pub use lock::*;
pub use pagination::*;
pub use scoring::*;
pub use season::*;
