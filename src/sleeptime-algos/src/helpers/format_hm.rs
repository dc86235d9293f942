use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Timelike as _};

pub trait FormatHM {
    fn format_hm(&self) -> String;
}

impl FormatHM for TimeDelta {
    fn format_hm(&self) -> String {
        let minutes = self.num_minutes();
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    }
}

impl FormatHM for NaiveTime {
    fn format_hm(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Clock time in the zone the value carries.
impl<Tz: TimeZone> FormatHM for DateTime<Tz> {
    fn format_hm(&self) -> String {
        self.time().format_hm()
    }
}
