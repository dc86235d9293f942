use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a moment of device use was observed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ActivitySource {
    /// The user opened the app.
    #[default]
    Foreground,
    /// A scheduled background wake-up found the device reachable.
    BackgroundRefresh,
}

/// A moment the person was known to be awake and using a device. `date` is an
/// instant, so gaps between two timestamps are elapsed time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimestamp {
    pub date: DateTime<Utc>,
    pub source: ActivitySource,
}

impl ActivityTimestamp {
    pub fn new(date: DateTime<Utc>, source: ActivitySource) -> Self {
        Self { date, source }
    }

    pub fn foreground(date: DateTime<Utc>) -> Self {
        Self::new(date, ActivitySource::Foreground)
    }

    pub fn background(date: DateTime<Utc>) -> Self {
        Self::new(date, ActivitySource::BackgroundRefresh)
    }
}
