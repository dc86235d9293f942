use std::fmt;

use chrono::{DateTime, TimeZone, Timelike as _};

/// Returns whether `hour` lies in the `[start, end)` range of a 24-hour clock.
///
/// When `start > end` the window wraps past midnight, so `20..10` covers
/// 20:00 through 09:59. `start == end` is an empty window.
pub fn in_window(hour: u32, start: u32, end: u32) -> bool {
    if start > end {
        hour >= start || hour < end
    } else {
        hour >= start && hour < end
    }
}

/// Hours of the day during which an inactivity gap may begin to count as sleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepWindow {
    pub start: u32,
    pub end: u32,
}

impl SleepWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        in_window(hour, self.start, self.end)
    }

    /// Tests the hour of `time` on its own zone's clock.
    pub fn contains<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> bool {
        self.contains_hour(time.hour())
    }
}

impl fmt::Display for SleepWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)?;
        if self.wraps_midnight() {
            write!(f, " (overnight)")?;
        }
        Ok(())
    }
}
