mod activity;
pub use activity::{ActivitySource, ActivityTimestamp};

mod sleep;
pub use sleep::{PeriodKey, SleepPeriod, SleepQuality};

mod settings;
pub use settings::{SettingsError, SleepSettings};
