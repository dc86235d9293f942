use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sleeptime_entities::activity_timestamps;
use sleeptime_types::{ActivitySource, ActivityTimestamp};

use crate::DatabaseHandler;

#[derive(Default, Debug)]
pub struct SearchActivity {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

impl SearchActivity {
    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            ..Default::default()
        }
    }

    pub(crate) fn conditions(self) -> Condition {
        Condition::all()
            .add_option(
                self.from
                    .map(|from| activity_timestamps::Column::Date.gt(from)),
            )
            .add_option(self.to.map(|to| activity_timestamps::Column::Date.lt(to)))
    }
}

impl DatabaseHandler {
    pub async fn create_activity(&self, activity: ActivityTimestamp) -> anyhow::Result<()> {
        let model = activity_timestamps::ActiveModel {
            id: NotSet,
            date: Set(activity.date),
            source: Set(activity.source.to_string()),
        };

        activity_timestamps::Entity::insert(model)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn search_activity(
        &self,
        options: SearchActivity,
    ) -> anyhow::Result<Vec<ActivityTimestamp>> {
        let limit = options.limit;
        activity_timestamps::Entity::find()
            .filter(options.conditions())
            .order_by_asc(activity_timestamps::Column::Date)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(map_activity)
            .collect()
    }

    pub async fn count_activity(&self) -> anyhow::Result<u64> {
        let count = activity_timestamps::Entity::find().count(&self.db).await?;
        Ok(count)
    }

    pub async fn get_latest_activity(&self) -> anyhow::Result<Option<ActivityTimestamp>> {
        activity_timestamps::Entity::find()
            .order_by_desc(activity_timestamps::Column::Date)
            .one(&self.db)
            .await?
            .map(map_activity)
            .transpose()
    }
}

fn map_activity(value: activity_timestamps::Model) -> anyhow::Result<ActivityTimestamp> {
    Ok(ActivityTimestamp {
        date: value.date,
        source: ActivitySource::from_str(value.source.as_str())?,
    })
}
