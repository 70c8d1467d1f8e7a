pub use sea_orm_migration::prelude::*;

mod m20251110_000001_create_prediction_tables;
mod m20260118_000001_add_lock_ledger;
mod m20260302_000001_add_seasons;
mod m20260415_000001_add_outcome_score_error;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251110_000001_create_prediction_tables::Migration),
            Box::new(m20260118_000001_add_lock_ledger::Migration),
            Box::new(m20260302_000001_add_seasons::Migration),
            Box::new(m20260415_000001_add_outcome_score_error::Migration),
        ]
    }
}
