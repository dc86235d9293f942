use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
}

impl SleepQuality {
    const FAIR_FROM: TimeDelta = TimeDelta::hours(6);
    const GOOD_FROM: TimeDelta = TimeDelta::hours(8);

    pub fn from_duration(duration: TimeDelta) -> Self {
        if duration < Self::FAIR_FROM {
            Self::Poor
        } else if duration < Self::GOOD_FROM {
            Self::Fair
        } else {
            Self::Good
        }
    }
}

/// Identity of a sleep period, used to key state that lives outside the period
/// itself (e.g. export status).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A detected interval of sleep. Bounds are fixed at construction and
/// `end` is always after `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SleepPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SleepPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn quality(&self) -> SleepQuality {
        SleepQuality::from_duration(self.duration())
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            start: self.start,
            end: self.end,
        }
    }
}

impl From<SleepPeriod> for PeriodKey {
    fn from(value: SleepPeriod) -> Self {
        value.key()
    }
}
