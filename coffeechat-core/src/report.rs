//! What a run produced.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

use crate::pair::PairKey;
use crate::slots::CandidateSlot;

/// A booked (or, in a dry run, simulated) event.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    /// 1-based position among the run's bookings.
    pub number: usize,
    /// "Alice ↔ Bob", or "organizer reminder for <email>".
    pub title: String,
    pub slot: CandidateSlot,
    /// `slot.start` in the organizer's timezone.
    pub local_start: DateTime<Tz>,
    pub dry_run: bool,
    /// Link returned by the calendar, absent in dry runs.
    pub link: Option<String>,
}

impl Booking {
    /// One console line, e.g. `[Run 3] Scheduled: Alice ↔ Bob at 2025-06-02 15:00 CEST`.
    pub fn describe(&self) -> String {
        let at = self.local_start.format("%Y-%m-%d %H:%M %Z");
        if self.dry_run {
            format!("[Dry Run {}] Would schedule: {} at {}", self.number, self.title, at)
        } else {
            format!("[Run {}] Scheduled: {} at {}", self.number, self.title, at)
        }
    }
}

/// Aggregate of one scheduler run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Size of the Group A × Group B cross product.
    pub expected_meetings: usize,
    /// Pair meetings booked; the organizer reminder is not counted.
    pub events_created: usize,
    /// Organizer-local date of the latest booked meeting.
    pub latest_event_date: Option<NaiveDate>,
    /// Pairs without a meeting, with the joined reasons.
    pub unfulfilled: BTreeMap<PairKey, String>,
    pub bookings: Vec<Booking>,
    pub reminder: Option<Booking>,
}

impl ScheduleReport {
    pub fn total_unfulfilled(&self) -> usize {
        self.unfulfilled.len()
    }

    /// Track the latest booked date.
    pub(crate) fn saw_date(&mut self, date: NaiveDate) {
        if self.latest_event_date.is_none_or(|latest| date > latest) {
            self.latest_event_date = Some(date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Paris;

    fn booking(dry_run: bool) -> Booking {
        let local_start = Paris.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
        let start = local_start.with_timezone(&Utc);
        Booking {
            number: 3,
            title: "Alice ↔ Bob".to_string(),
            slot: CandidateSlot {
                start,
                end: start + chrono::Duration::minutes(20),
            },
            local_start,
            dry_run,
            link: None,
        }
    }

    #[test]
    fn describe_lines() {
        assert_eq!(
            booking(true).describe(),
            "[Dry Run 3] Would schedule: Alice ↔ Bob at 2025-06-02 15:00 CEST"
        );
        assert_eq!(
            booking(false).describe(),
            "[Run 3] Scheduled: Alice ↔ Bob at 2025-06-02 15:00 CEST"
        );
    }

    #[test]
    fn latest_date_only_moves_forward() {
        let mut report = ScheduleReport::default();
        let d = |day| NaiveDate::from_ymd_opt(2025, 6, day).unwrap();

        report.saw_date(d(4));
        report.saw_date(d(2));
        assert_eq!(report.latest_event_date, Some(d(4)));
        report.saw_date(d(5));
        assert_eq!(report.latest_event_date, Some(d(5)));
    }
}
