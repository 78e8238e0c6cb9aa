//! Preferred meeting windows per timezone pair.
//!
//! Each supported pair of timezone labels maps to a window expressed in
//! organizer-local wall-clock time. The table is symmetric: `(Paris, Boston)`
//! and `(Boston, Paris)` resolve to the same window.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One row of the window table as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRule {
    pub a: String,
    pub b: String,
    /// Organizer-local start hour, fractional (17.5 = 17:30).
    pub start: f64,
    /// Window length in hours.
    pub duration: f64,
}

impl WindowRule {
    pub fn new(a: &str, b: &str, start: f64, duration: f64) -> Self {
        WindowRule {
            a: a.to_string(),
            b: b.to_string(),
            start,
            duration,
        }
    }
}

/// A preferred window: where it starts in organizer-local time and how long it lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start_minute: u32,
    duration_minutes: u32,
}

impl TimeWindow {
    /// Build from fractional hours. Returns `None` for a start outside the day,
    /// a non-positive duration, or a window that runs past midnight.
    pub fn from_hours(start: f64, duration: f64) -> Option<Self> {
        if !(0.0..24.0).contains(&start) || !duration.is_finite() || duration <= 0.0 {
            return None;
        }
        if start + duration > 24.0 {
            return None;
        }

        Some(TimeWindow {
            start_minute: (start * 60.0).round() as u32,
            duration_minutes: (duration * 60.0).round() as u32,
        })
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(self.start_minute * 60, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Whether a candidate starting at this organizer-local time is still
    /// inside the window. Only the hour of the candidate counts, so a window
    /// ending at 17:30 still admits a 17:30 start.
    pub fn admits(&self, local: NaiveTime) -> bool {
        local.hour() * 60 < self.start_minute + self.duration_minutes
    }

    /// The window start on `date` as an absolute instant in `tz`.
    ///
    /// Uses the zone's rules for that date, so DST shifts the UTC offset. An
    /// ambiguous local time resolves to the earlier instant; a local time that
    /// does not exist (spring-forward gap) yields `None`.
    pub fn localize(&self, date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
        tz.from_local_datetime(&date.and_time(self.start_time()))
            .earliest()
    }
}

/// Why no window could be produced for a pair on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGap {
    /// The timezone pair is not in the table.
    Unsupported,
    /// The window start falls in a DST gap on that date.
    NonexistentStart,
}

/// A window pinned to a specific date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub window: TimeWindow,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// Symmetric lookup table from unordered timezone-label pairs to windows.
#[derive(Debug, Clone)]
pub struct WindowTable {
    organizer_tz: Tz,
    windows: HashMap<(String, String), TimeWindow>,
}

fn table_key(x: &str, y: &str) -> (String, String) {
    let (x, y) = (x.trim(), y.trim());
    if x <= y {
        (x.to_string(), y.to_string())
    } else {
        (y.to_string(), x.to_string())
    }
}

impl WindowTable {
    /// Build the table. Rules with invalid hours are skipped; later rules for
    /// the same pair replace earlier ones.
    pub fn new(organizer_tz: Tz, rules: &[WindowRule]) -> Self {
        let windows = rules
            .iter()
            .filter_map(|rule| {
                TimeWindow::from_hours(rule.start, rule.duration)
                    .map(|window| (table_key(&rule.a, &rule.b), window))
            })
            .collect();

        WindowTable {
            organizer_tz,
            windows,
        }
    }

    pub fn organizer_tz(&self) -> Tz {
        self.organizer_tz
    }

    pub fn lookup(&self, tz_a: &str, tz_b: &str) -> Option<TimeWindow> {
        self.windows.get(&table_key(tz_a, tz_b)).copied()
    }

    /// Resolve the window for two timezone labels on `date`.
    pub fn resolve(&self, tz_a: &str, tz_b: &str, date: NaiveDate) -> Result<WindowSpan, WindowGap> {
        let window = self.lookup(tz_a, tz_b).ok_or(WindowGap::Unsupported)?;
        let start = window
            .localize(date, self.organizer_tz)
            .ok_or(WindowGap::NonexistentStart)?;

        Ok(WindowSpan {
            window,
            start,
            end: start + window.duration(),
        })
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// The built-in table, for an organizer in Paris.
pub fn default_rules() -> Vec<WindowRule> {
    vec![
        WindowRule::new("Paris", "Boston", 15.0, 3.0),
        WindowRule::new("Paris", "Chicago", 16.0, 2.0),
        WindowRule::new("Paris", "Seattle", 17.5, 1.5),
        WindowRule::new("Paris", "Paris", 10.0, 7.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Europe::Paris;

    fn table() -> WindowTable {
        WindowTable::new(Paris, &default_rules())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn resolve_is_symmetric_for_every_listed_pair() {
        let table = table();
        let dates = [date(2025, 1, 15), date(2025, 3, 31), date(2025, 7, 4), date(2025, 10, 27)];

        for rule in default_rules() {
            for d in dates {
                assert_eq!(table.resolve(&rule.a, &rule.b, d), table.resolve(&rule.b, &rule.a, d));
            }
        }
    }

    #[test]
    fn resolve_is_idempotent() {
        let table = table();
        let d = date(2025, 6, 2);
        assert_eq!(table.resolve("Seattle", "Paris", d), table.resolve("Seattle", "Paris", d));
    }

    #[test]
    fn unsupported_pair() {
        let table = table();
        assert_eq!(
            table.resolve("Boston", "Seattle", date(2025, 6, 2)),
            Err(WindowGap::Unsupported)
        );
        assert_eq!(table.lookup("Boston", "Boston"), None);
    }

    #[test]
    fn fractional_start() {
        let window = table().lookup("Paris", "Seattle").unwrap();
        assert_eq!(window.start_time(), NaiveTime::from_hms_opt(17, 30, 0).unwrap());
        assert_eq!(window.duration(), Duration::minutes(90));
        assert!(window.admits(NaiveTime::from_hms_opt(18, 30, 0).unwrap()));
        assert!(!window.admits(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
    }

    #[test]
    fn fractional_end_admits_its_last_hour() {
        // Paris ↔ Paris runs 10:00 + 7.5h, so every start during hour 17 counts.
        let window = table().lookup("Paris", "Paris").unwrap();
        assert!(window.admits(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        assert!(window.admits(NaiveTime::from_hms_opt(17, 30, 0).unwrap()));
        assert!(!window.admits(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
    }

    #[test]
    fn localization_follows_dst() {
        let table = table();

        // CET (UTC+1) in winter, CEST (UTC+2) in summer.
        let winter = table.resolve("Paris", "Boston", date(2025, 1, 15)).unwrap();
        let summer = table.resolve("Paris", "Boston", date(2025, 7, 15)).unwrap();

        assert_eq!(
            winter.start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 1, 15, 14, 0, 0).unwrap()
        );
        assert_eq!(
            summer.start.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 7, 15, 13, 0, 0).unwrap()
        );
        assert_eq!(summer.end - summer.start, Duration::hours(3));
    }

    #[test]
    fn start_in_dst_gap() {
        // 2025-03-30 02:00-03:00 does not exist in Paris.
        let table = WindowTable::new(Paris, &[WindowRule::new("X", "Y", 2.5, 1.0)]);
        assert_eq!(
            table.resolve("X", "Y", date(2025, 3, 30)),
            Err(WindowGap::NonexistentStart)
        );
    }

    #[test]
    fn invalid_rules_are_skipped() {
        let table = WindowTable::new(
            Paris,
            &[
                WindowRule::new("X", "Y", 25.0, 1.0),
                WindowRule::new("X", "Z", 9.0, 0.0),
                WindowRule::new("X", "X", 9.0, 1e12),
                WindowRule::new("Z", "Z", 23.0, 2.0),
                WindowRule::new("Y", "Z", 9.0, 1.0),
            ],
        );
        assert_eq!(table.len(), 1);
        assert!(table.lookup("Z", "Y").is_some());
    }
}
