use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use sleeptime_types::{ActivityTimestamp, SleepPeriod, SleepSettings};

use super::SleepWindow;

/// How far apart two periods' starts (and ends) may be while still being the
/// same sleep.
pub const DEFAULT_DEDUP_TOLERANCE: TimeDelta = TimeDelta::minutes(30);

/// Infers sleep from gaps between moments of known device use.
///
/// A gap becomes a sleep period when it lasts at least `min_duration`, begins
/// inside `window` and is not already covered by a recorded period. Gaps are
/// measured between instants; only the window test reads the wall clock of
/// `timezone`.
#[derive(Clone, Copy, Debug)]
pub struct SleepDetector<Tz = Local> {
    pub min_duration: TimeDelta,
    pub window: SleepWindow,
    pub tolerance: TimeDelta,
    pub timezone: Tz,
}

impl SleepDetector {
    pub fn new(settings: &SleepSettings) -> Self {
        Self {
            min_duration: settings.min_duration(),
            window: SleepWindow::new(settings.window_start, settings.window_end),
            tolerance: DEFAULT_DEDUP_TOLERANCE,
            timezone: Local,
        }
    }
}

impl<Tz: TimeZone> SleepDetector<Tz> {
    pub fn with_tolerance(mut self, tolerance: TimeDelta) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Evaluates the sleep window on the clock of `timezone` instead.
    pub fn in_timezone<Other: TimeZone>(self, timezone: Other) -> SleepDetector<Other> {
        SleepDetector {
            min_duration: self.min_duration,
            window: self.window,
            tolerance: self.tolerance,
            timezone,
        }
    }

    pub fn detect(
        &self,
        timestamps: &[ActivityTimestamp],
        existing: &[SleepPeriod],
    ) -> Vec<SleepPeriod> {
        if timestamps.len() < 2 {
            return Vec::new();
        }

        let mut sorted = timestamps.to_vec();
        sorted.sort_by_key(|t| t.date);

        sorted
            .windows(2)
            .filter_map(|pair| {
                let (start, end) = (pair[0].date, pair[1].date);

                if end - start < self.min_duration {
                    return None;
                }

                if !self.window.contains(&start.with_timezone(&self.timezone)) {
                    trace!("gap {start} -> {end} starts outside the sleep window");
                    return None;
                }

                if self.is_recorded(start, end, existing) {
                    debug!("gap {start} -> {end} is already recorded");
                    return None;
                }

                SleepPeriod::new(start, end)
            })
            .collect()
    }

    /// Like [`detect`](Self::detect), treating `now` as a foreground event so
    /// that a gap which ended with the current app open is considered.
    pub fn detect_including(
        &self,
        now: DateTime<Utc>,
        timestamps: &[ActivityTimestamp],
        existing: &[SleepPeriod],
    ) -> Vec<SleepPeriod> {
        let mut all = Vec::with_capacity(timestamps.len() + 1);
        all.extend_from_slice(timestamps);
        all.push(ActivityTimestamp::foreground(now));
        self.detect(&all, existing)
    }

    pub fn detect_including_now(
        &self,
        timestamps: &[ActivityTimestamp],
        existing: &[SleepPeriod],
    ) -> Vec<SleepPeriod> {
        self.detect_including(Utc::now(), timestamps, existing)
    }

    fn is_recorded(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        existing: &[SleepPeriod],
    ) -> bool {
        existing.iter().any(|period| {
            (period.start() - start).abs() < self.tolerance
                && (period.end() - end).abs() < self.tolerance
        })
    }
}

impl Default for SleepDetector {
    fn default() -> Self {
        Self::new(&SleepSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, Timelike as _};
    use rand::seq::SliceRandom;
    use sleeptime_types::SleepQuality;

    use super::*;

    fn at(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
            .and_utc()
    }

    fn activity(times: &[DateTime<Utc>]) -> Vec<ActivityTimestamp> {
        times.iter().copied().map(ActivityTimestamp::background).collect()
    }

    fn period(start: DateTime<Utc>, end: DateTime<Utc>) -> SleepPeriod {
        SleepPeriod::new(start, end).unwrap()
    }

    fn defaults() -> SleepDetector<Utc> {
        SleepDetector::default().in_timezone(Utc)
    }

    fn detector(min_hours: i64, start: u32, end: u32) -> SleepDetector<Utc> {
        SleepDetector {
            min_duration: TimeDelta::hours(min_hours),
            window: SleepWindow::new(start, end),
            tolerance: DEFAULT_DEDUP_TOLERANCE,
            timezone: Utc,
        }
    }

    /// Eastern daylight time, and the standard time that follows the
    /// 2024-11-03 fall-back.
    fn edt() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    fn est() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn needs_two_timestamps() {
        let detector = defaults();
        assert!(detector.detect(&[], &[]).is_empty());
        assert!(detector.detect(&activity(&[at(1, 22, 0, 0)]), &[]).is_empty());
    }

    #[test]
    fn overnight_gap_is_detected() {
        let detector = defaults();
        let found = detector.detect(&activity(&[at(1, 22, 0, 0), at(2, 6, 30, 0)]), &[]);

        assert_eq!(found, vec![period(at(1, 22, 0, 0), at(2, 6, 30, 0))]);
        assert_eq!(found[0].quality(), SleepQuality::Good);
    }

    #[test]
    fn minimum_duration_is_inclusive() {
        let detector = defaults();

        let exact = activity(&[at(1, 23, 0, 0), at(2, 3, 0, 0)]);
        assert_eq!(detector.detect(&exact, &[]).len(), 1);

        let short = activity(&[at(1, 23, 0, 0), at(2, 2, 59, 59)]);
        assert!(detector.detect(&short, &[]).is_empty());
    }

    #[test]
    fn plain_window_checks_gap_start() {
        let detector = detector(4, 1, 5);
        let detect_from = |start: DateTime<Utc>| {
            detector.detect(&activity(&[start, start + TimeDelta::hours(5)]), &[])
        };

        assert!(detect_from(at(2, 0, 30, 0)).is_empty());
        assert_eq!(detect_from(at(2, 1, 0, 0)).len(), 1);
        assert_eq!(detect_from(at(2, 4, 59, 0)).len(), 1);
        assert!(detect_from(at(2, 5, 0, 0)).is_empty());
    }

    #[test]
    fn wrapping_window_checks_gap_start() {
        let detector = defaults();
        let detect_from = |start: DateTime<Utc>| {
            detector.detect(&activity(&[start, start + TimeDelta::hours(5)]), &[])
        };

        assert_eq!(detect_from(at(1, 23, 0, 0)).len(), 1);
        assert_eq!(detect_from(at(2, 9, 0, 0)).len(), 1);
        assert!(detect_from(at(2, 10, 0, 0)).is_empty());
        assert!(detect_from(at(1, 19, 0, 0)).is_empty());
    }

    #[test]
    fn window_uses_the_detector_timezone() {
        // 03:00 UTC is 22:00 the evening before in EST.
        let start = at(2, 3, 0, 0);
        let timestamps = activity(&[start, start + TimeDelta::hours(8)]);

        assert!(detector(4, 20, 23).detect(&timestamps, &[]).is_empty());
        let found = detector(4, 20, 23).in_timezone(est()).detect(&timestamps, &[]);
        assert_eq!(found, vec![period(start, start + TimeDelta::hours(8))]);
    }

    #[test]
    fn gap_across_fall_back_is_elapsed_time() {
        // 00:30 EDT to 04:00 EST is three and a half hours on the wall clock
        // but four and a half hours apart.
        let start = edt().with_ymd_and_hms(2024, 11, 3, 0, 30, 0).unwrap().to_utc();
        let end = est().with_ymd_and_hms(2024, 11, 3, 4, 0, 0).unwrap().to_utc();
        assert_eq!(start, "2024-11-03T04:30:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(end, "2024-11-03T09:00:00Z".parse::<DateTime<Utc>>().unwrap());

        let detector = SleepDetector::default().in_timezone(edt());
        let found = detector.detect(&activity(&[start, end]), &[]);

        assert_eq!(found, vec![period(start, end)]);
        assert_eq!(found[0].duration(), TimeDelta::minutes(270));
        assert_eq!(found[0].start().with_timezone(&edt()).hour(), 0);
    }

    #[test]
    fn repeated_hour_sorts_by_instant() {
        // 01:50 EDT happens before 01:10 EST.
        let evening = edt().with_ymd_and_hms(2024, 11, 2, 21, 0, 0).unwrap().to_utc();
        let first_pass = edt().with_ymd_and_hms(2024, 11, 3, 1, 50, 0).unwrap().to_utc();
        let second_pass = est().with_ymd_and_hms(2024, 11, 3, 1, 10, 0).unwrap().to_utc();
        let morning = est().with_ymd_and_hms(2024, 11, 3, 7, 0, 0).unwrap().to_utc();
        assert!(first_pass < second_pass);

        let detector = SleepDetector::default().in_timezone(edt());
        let found = detector.detect(
            &activity(&[morning, second_pass, first_pass, evening]),
            &[],
        );

        assert_eq!(
            found,
            vec![period(evening, first_pass), period(second_pass, morning)]
        );
        assert_eq!(found[0].duration(), TimeDelta::minutes(290));
        assert_eq!(found[1].duration(), TimeDelta::minutes(350));
    }

    #[test]
    fn gap_ending_inside_window_is_not_enough() {
        let detector = defaults();
        let found = detector.detect(&activity(&[at(1, 14, 0, 0), at(1, 21, 0, 0)]), &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn near_duplicates_are_suppressed() {
        let detector = defaults();
        let existing = [period(at(1, 22, 0, 0), at(2, 6, 0, 0))];

        let close = activity(&[at(1, 22, 10, 0), at(2, 6, 20, 0)]);
        assert!(detector.detect(&close, &existing).is_empty());

        let start_off = activity(&[at(1, 22, 40, 0), at(2, 6, 20, 0)]);
        assert_eq!(
            detector.detect(&start_off, &existing),
            vec![period(at(1, 22, 40, 0), at(2, 6, 20, 0))]
        );
    }

    #[test]
    fn tolerance_is_exclusive() {
        let detector = defaults();
        let existing = [period(at(1, 22, 0, 0), at(2, 6, 0, 0))];

        let end_off = activity(&[at(1, 22, 0, 0), at(2, 6, 30, 0)]);
        assert_eq!(detector.detect(&end_off, &existing).len(), 1);

        let just_inside = activity(&[at(1, 22, 29, 59), at(2, 6, 29, 59)]);
        assert!(detector.detect(&just_inside, &existing).is_empty());
    }

    #[test]
    fn tolerance_can_be_tuned() {
        let detector = defaults().with_tolerance(TimeDelta::hours(1));
        let existing = [period(at(1, 22, 0, 0), at(2, 6, 0, 0))];

        let drifted = activity(&[at(1, 22, 40, 0), at(2, 6, 50, 0)]);
        assert!(detector.detect(&drifted, &existing).is_empty());
    }

    #[test]
    fn output_is_chronological_regardless_of_input_order() {
        let detector = defaults();
        let mut timestamps = activity(&[
            at(1, 12, 0, 0),
            at(1, 23, 0, 0),
            at(2, 7, 0, 0),
            at(2, 10, 30, 0),
            at(2, 22, 30, 0),
            at(3, 6, 0, 0),
            at(3, 6, 15, 0),
        ]);
        timestamps.shuffle(&mut rand::rng());

        let found = detector.detect(&timestamps, &[]);
        assert_eq!(
            found,
            vec![
                period(at(1, 23, 0, 0), at(2, 7, 0, 0)),
                period(at(2, 22, 30, 0), at(3, 6, 0, 0)),
            ]
        );
    }

    #[test]
    fn identical_timestamps_never_form_a_period() {
        let detector = SleepDetector {
            min_duration: TimeDelta::zero(),
            ..defaults()
        };
        let found = detector.detect(&activity(&[at(1, 22, 0, 0), at(1, 22, 0, 0)]), &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn degenerate_window_detects_nothing() {
        let detector = detector(4, 22, 22);
        let found = detector.detect(&activity(&[at(1, 22, 0, 0), at(2, 6, 0, 0)]), &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn including_closes_the_open_gap() {
        let detector = defaults();
        let timestamps = activity(&[at(1, 18, 0, 0), at(1, 22, 0, 0)]);

        let found = detector.detect_including(at(2, 6, 30, 0), &timestamps, &[]);
        assert_eq!(found, vec![period(at(1, 22, 0, 0), at(2, 6, 30, 0))]);
    }

    #[test]
    fn including_with_single_timestamp() {
        let detector = defaults();
        let timestamps = activity(&[at(1, 23, 0, 0)]);

        let found = detector.detect_including(at(2, 7, 0, 0), &timestamps, &[]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn including_again_shortly_after_is_idempotent() {
        let detector = defaults();
        let timestamps = activity(&[at(1, 21, 0, 0), at(1, 22, 0, 0)]);

        let first = detector.detect_including(at(2, 6, 30, 0), &timestamps, &[]);
        assert_eq!(first.len(), 1);

        let second = detector.detect_including(at(2, 6, 35, 0), &timestamps, &first);
        assert!(second.is_empty());
    }

    #[test]
    fn including_now_uses_the_clock() {
        let last = Utc::now() - TimeDelta::hours(5);
        let hour = last.hour();
        let detector = detector(4, hour, (hour + 1) % 24);

        let found = detector.detect_including_now(&activity(&[last]), &[]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start(), last);
        assert!(found[0].duration() >= TimeDelta::hours(5));
    }
}
