#[macro_use]
extern crate log;

mod sleeptime;
pub use sleeptime::{ActivityStatus, DETECTION_LOOKBACK, SleepTime, SyncOutcome};

pub mod health;
pub use health::{HealthExporter, HttpHealthExporter};

pub use sleeptime_algos as algo;
pub use sleeptime_db::DatabaseHandler;
pub use sleeptime_types as types;
