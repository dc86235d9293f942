use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{EntityTrait, Set, sea_query::OnConflict};
use sleeptime_entities::period_syncs;
use sleeptime_types::{PeriodKey, SleepPeriod};

use crate::DatabaseHandler;

// Export status is kept beside the periods, keyed by their bounds, so a stored
// period is never rewritten after detection.
impl DatabaseHandler {
    pub async fn mark_synced(&self, period: &SleepPeriod) -> anyhow::Result<()> {
        let model = period_syncs::ActiveModel {
            start: Set(period.start()),
            end: Set(period.end()),
            synced_at: Set(Utc::now()),
        };

        period_syncs::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([period_syncs::Column::Start, period_syncs::Column::End])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn is_synced(&self, period: &SleepPeriod) -> anyhow::Result<bool> {
        let row = period_syncs::Entity::find_by_id((period.start(), period.end()))
            .one(&self.db)
            .await?;

        Ok(row.is_some())
    }

    /// Stored periods with no export recorded, oldest first.
    pub async fn get_unsynced_periods(&self) -> anyhow::Result<Vec<SleepPeriod>> {
        let synced = period_syncs::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| PeriodKey {
                start: row.start,
                end: row.end,
            })
            .collect::<HashSet<_>>();

        let periods = self.get_sleep_periods(None).await?;
        Ok(periods
            .into_iter()
            .filter(|period| !synced.contains(&period.key()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, Utc};

    use super::*;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[tokio::test]
    async fn new_periods_are_unsynced() {
        let db = DatabaseHandler::new("sqlite::memory:").await;
        let period = SleepPeriod::new(at(1, 22), at(2, 6)).unwrap();
        db.create_sleep_periods(&[period]).await.unwrap();

        assert!(!db.is_synced(&period).await.unwrap());
        assert_eq!(db.get_unsynced_periods().await.unwrap(), vec![period]);
    }

    #[tokio::test]
    async fn mark_synced_is_idempotent() {
        let db = DatabaseHandler::new("sqlite::memory:").await;
        let first = SleepPeriod::new(at(1, 22), at(2, 6)).unwrap();
        let second = SleepPeriod::new(at(2, 23), at(3, 7)).unwrap();
        db.create_sleep_periods(&[first, second]).await.unwrap();

        db.mark_synced(&first).await.unwrap();
        db.mark_synced(&first).await.unwrap();

        assert!(db.is_synced(&first).await.unwrap());
        assert!(!db.is_synced(&second).await.unwrap());
        assert_eq!(db.get_unsynced_periods().await.unwrap(), vec![second]);
    }
}
