use chrono::{DateTime, TimeDelta, Utc};
use sleeptime_algos::SleepDetector;
use sleeptime_db::{DatabaseHandler, SearchActivity};
use sleeptime_types::{ActivitySource, ActivityTimestamp, SleepPeriod, SleepSettings};

use crate::HealthExporter;

/// Only activity this recent is fed to a detection run.
pub const DETECTION_LOOKBACK: TimeDelta = TimeDelta::hours(48);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Disabled,
    NothingToSync,
    AlreadySynced(SleepPeriod),
    Synced(SleepPeriod),
}

/// What the store knows about recent device use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityStatus {
    pub count: u64,
    pub last: Option<ActivityTimestamp>,
}

pub struct SleepTime {
    pub database: DatabaseHandler,
    pub settings: SleepSettings,
}

impl SleepTime {
    pub fn new(database: DatabaseHandler, settings: SleepSettings) -> Self {
        Self { database, settings }
    }

    fn detector(&self) -> SleepDetector {
        SleepDetector::new(&self.settings)
    }

    pub async fn record_activity(
        &self,
        source: ActivitySource,
    ) -> anyhow::Result<ActivityTimestamp> {
        let activity = ActivityTimestamp::new(Utc::now(), source);
        self.database.create_activity(activity).await?;
        debug!("recorded {} activity at {}", activity.source, activity.date);
        Ok(activity)
    }

    pub async fn detect_sleep(&self) -> anyhow::Result<Vec<SleepPeriod>> {
        self.detect_sleep_at(Utc::now()).await
    }

    /// Runs detection over the last [`DETECTION_LOOKBACK`] of activity, closing
    /// the open gap at `now`, and stores whatever is new.
    pub async fn detect_sleep_at(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<SleepPeriod>> {
        let timestamps = self
            .database
            .search_activity(SearchActivity::since(now - DETECTION_LOOKBACK))
            .await?;

        if timestamps.len() < 2 {
            info!(
                "not enough activity to detect sleep ({} timestamps in the last {}h)",
                timestamps.len(),
                DETECTION_LOOKBACK.num_hours()
            );
            return Ok(Vec::new());
        }

        let detector = self.detector();
        debug!(
            "looking for gaps of at least {}h starting in {}",
            self.settings.min_sleep_hours, detector.window
        );

        let existing = self.database.get_sleep_periods(None).await?;
        let detected = detector.detect_including(now, &timestamps, &existing);

        self.database.create_sleep_periods(&detected).await?;
        for period in &detected {
            info!(
                "detected sleep {} -> {} ({})",
                period.start(),
                period.end(),
                period.quality()
            );
        }

        Ok(detected)
    }

    /// Periods that ended within the last `days` days, newest first.
    pub async fn history(&self, days: i64) -> anyhow::Result<Vec<SleepPeriod>> {
        let cutoff = Utc::now() - TimeDelta::days(days);
        let mut periods = self.database.get_sleep_periods(Some(cutoff)).await?;
        periods.sort_by_key(|p| std::cmp::Reverse(p.end()));
        Ok(periods)
    }

    pub async fn activity_status(&self) -> anyhow::Result<ActivityStatus> {
        Ok(ActivityStatus {
            count: self.database.count_activity().await?,
            last: self.database.get_latest_activity().await?,
        })
    }

    /// Exports the most recent period unless it was exported before.
    pub async fn sync_latest<E>(&self, exporter: &E) -> anyhow::Result<SyncOutcome>
    where
        E: HealthExporter,
    {
        if !self.settings.health_sync_enabled {
            return Ok(SyncOutcome::Disabled);
        }

        match self.database.get_latest_sleep().await? {
            Some(latest) => self.sync_period(exporter, &latest).await,
            None => Ok(SyncOutcome::NothingToSync),
        }
    }

    /// Exports one chosen period unless it was exported before.
    pub async fn sync_period<E>(
        &self,
        exporter: &E,
        period: &SleepPeriod,
    ) -> anyhow::Result<SyncOutcome>
    where
        E: HealthExporter,
    {
        if !self.settings.health_sync_enabled {
            return Ok(SyncOutcome::Disabled);
        }

        if self.database.is_synced(period).await? {
            return Ok(SyncOutcome::AlreadySynced(*period));
        }

        exporter.export(period).await?;
        self.database.mark_synced(period).await?;
        Ok(SyncOutcome::Synced(*period))
    }

    /// Exports every period not yet exported, oldest first, stopping at the
    /// first failure. Returns how many were exported.
    pub async fn sync_pending<E>(&self, exporter: &E) -> anyhow::Result<usize>
    where
        E: HealthExporter,
    {
        if !self.settings.health_sync_enabled {
            info!("health sync is disabled");
            return Ok(0);
        }

        let pending = self.database.get_unsynced_periods().await?;
        for (synced, period) in pending.iter().enumerate() {
            if let Err(error) = exporter.export(period).await {
                warn!("health export stopped after {synced} periods: {error}");
                return Err(error);
            }
            self.database.mark_synced(period).await?;
        }

        Ok(pending.len())
    }
}
