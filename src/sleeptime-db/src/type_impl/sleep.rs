use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::OnConflict,
};
use sleeptime_entities::sleep_periods;
use sleeptime_types::SleepPeriod;
use uuid::Uuid;

use crate::DatabaseHandler;

impl DatabaseHandler {
    /// Periods ordered by start, optionally only those ending after `from`.
    pub async fn get_sleep_periods(
        &self,
        from: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<SleepPeriod>> {
        let filter = Condition::all().add_option(from.map(|f| sleep_periods::Column::End.gt(f)));

        sleep_periods::Entity::find()
            .filter(filter)
            .order_by_asc(sleep_periods::Column::Start)
            .all(&self.db)
            .await?
            .into_iter()
            .map(map_sleep_period)
            .collect()
    }

    /// The first stored period starting in `[from, to)`.
    pub async fn get_sleep_period_starting(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Option<SleepPeriod>> {
        sleep_periods::Entity::find()
            .filter(sleep_periods::Column::Start.gte(from))
            .filter(sleep_periods::Column::Start.lt(to))
            .order_by_asc(sleep_periods::Column::Start)
            .one(&self.db)
            .await?
            .map(map_sleep_period)
            .transpose()
    }

    pub async fn get_latest_sleep(&self) -> anyhow::Result<Option<SleepPeriod>> {
        sleep_periods::Entity::find()
            .order_by_desc(sleep_periods::Column::End)
            .one(&self.db)
            .await?
            .map(map_sleep_period)
            .transpose()
    }

    /// Stores the output of one detection run. Periods whose bounds are already
    /// stored are skipped. Returns the number of rows inserted.
    pub async fn create_sleep_periods(&self, periods: &[SleepPeriod]) -> anyhow::Result<u64> {
        if periods.is_empty() {
            return Ok(0);
        }

        let models = periods.iter().map(|period| sleep_periods::ActiveModel {
            id: Set(Uuid::new_v4()),
            start: Set(period.start()),
            end: Set(period.end()),
        });

        let txn = self.db.begin().await?;
        let inserted = sleep_periods::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([sleep_periods::Column::Start, sleep_periods::Column::End])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        txn.commit().await?;

        debug!("stored {inserted} of {} sleep periods", periods.len());
        Ok(inserted)
    }
}

fn map_sleep_period(value: sleep_periods::Model) -> anyhow::Result<SleepPeriod> {
    SleepPeriod::new(value.start, value.end).with_context(|| {
        format!(
            "sleep period {} ends at {} before it starts at {}",
            value.id, value.end, value.start
        )
    })
}
