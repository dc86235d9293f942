#[macro_use]
extern crate log;

pub(crate) mod window;
pub use window::{SleepWindow, in_window};

pub(crate) mod detection;
pub use detection::{DEFAULT_DEDUP_TOLERANCE, SleepDetector};

pub mod helpers;
