use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("minimum sleep duration must be between {min} and {max} hours, got {0}", min = SleepSettings::MIN_SLEEP_HOURS_RANGE.0, max = SleepSettings::MIN_SLEEP_HOURS_RANGE.1)]
    MinSleepOutOfRange(f64),
    #[error("minimum sleep duration must be a multiple of {step} hours, got {0}", step = SleepSettings::MIN_SLEEP_HOURS_STEP)]
    MinSleepStep(f64),
    #[error("hour of day must be between 0 and 23, got {0}")]
    InvalidHour(u32),
}

/// User-adjustable detection settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepSettings {
    /// Shortest inactivity gap, in hours, that counts as sleep.
    pub min_sleep_hours: f64,
    /// First hour of the sleep window.
    pub window_start: u32,
    /// Hour at which the sleep window closes. May be smaller than
    /// `window_start` when the window wraps past midnight.
    pub window_end: u32,
    pub health_sync_enabled: bool,
}

impl SleepSettings {
    pub const MIN_SLEEP_HOURS_RANGE: (f64, f64) = (2.0, 8.0);
    pub const MIN_SLEEP_HOURS_STEP: f64 = 0.5;

    pub const DEFAULT_MIN_SLEEP_HOURS: f64 = 4.0;
    pub const DEFAULT_WINDOW_START: u32 = 20;
    pub const DEFAULT_WINDOW_END: u32 = 10;

    pub fn validate(&self) -> Result<(), SettingsError> {
        let (min, max) = Self::MIN_SLEEP_HOURS_RANGE;
        if !(min..=max).contains(&self.min_sleep_hours) {
            return Err(SettingsError::MinSleepOutOfRange(self.min_sleep_hours));
        }

        if (self.min_sleep_hours / Self::MIN_SLEEP_HOURS_STEP).fract() != 0.0 {
            return Err(SettingsError::MinSleepStep(self.min_sleep_hours));
        }

        for hour in [self.window_start, self.window_end] {
            if hour > 23 {
                return Err(SettingsError::InvalidHour(hour));
            }
        }

        Ok(())
    }

    pub fn min_duration(&self) -> TimeDelta {
        TimeDelta::seconds((self.min_sleep_hours * 3600.0).round() as i64)
    }
}

impl Default for SleepSettings {
    fn default() -> Self {
        Self {
            min_sleep_hours: Self::DEFAULT_MIN_SLEEP_HOURS,
            window_start: Self::DEFAULT_WINDOW_START,
            window_end: Self::DEFAULT_WINDOW_END,
            health_sync_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = SleepSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.min_duration(), TimeDelta::hours(4));
        assert_eq!(settings.window_start, 20);
        assert_eq!(settings.window_end, 10);
        assert!(settings.health_sync_enabled);
    }

    #[test]
    fn min_sleep_range_is_enforced() {
        let settings = SleepSettings {
            min_sleep_hours: 1.5,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::MinSleepOutOfRange(1.5))
        );

        let settings = SleepSettings {
            min_sleep_hours: 8.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = SleepSettings {
            min_sleep_hours: 8.0,
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn min_sleep_step_is_enforced() {
        let settings = SleepSettings {
            min_sleep_hours: 4.25,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::MinSleepStep(4.25)));

        let settings = SleepSettings {
            min_sleep_hours: 6.5,
            ..Default::default()
        };
        assert_eq!(settings.min_duration(), TimeDelta::minutes(390));
    }

    #[test]
    fn hours_must_be_on_the_clock() {
        let settings = SleepSettings {
            window_end: 24,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::InvalidHour(24)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: SleepSettings =
            serde_json::from_str(r#"{ "window_start": 22 }"#).unwrap();
        assert_eq!(settings.window_start, 22);
        assert_eq!(settings.window_end, 10);
        assert_eq!(settings.min_sleep_hours, 4.0);
    }
}
