pub use sea_orm_migration::prelude::*;

mod m20250601_000000_activity_timestamps;
mod m20250601_000001_sleep_periods;
mod m20250601_000002_period_syncs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000000_activity_timestamps::Migration),
            Box::new(m20250601_000001_sleep_periods::Migration),
            Box::new(m20250601_000002_period_syncs::Migration),
        ]
    }
}
