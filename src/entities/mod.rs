pub mod event_options;
pub mod event_outcomes;
pub mod forfeited_locks;
pub mod lock_ledger_entries;
pub mod lock_ledgers;
pub mod prediction_events;
pub mod season_participants;
pub mod seasons;
pub mod user_event_scores;
pub mod user_tips;
pub mod users;

pub use event_options as event_option_entity;
pub use event_outcomes as event_outcome_entity;
pub use forfeited_locks as forfeited_lock_entity;
pub use lock_ledger_entries as lock_ledger_entry_entity;
pub use lock_ledgers as lock_ledger_entity;
pub use prediction_events as prediction_event_entity;
pub use season_participants as season_participant_entity;
pub use seasons as season_entity;
pub use user_event_scores as user_event_score_entity;
pub use user_tips as user_tip_entity;
pub use users as user_entity;

pub use event_outcomes::OutcomeKind;
pub use lock_ledger_entries::LockLedgerReason;
pub use user_tips::TipLockState;
