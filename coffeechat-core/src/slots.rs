//! Lazy, chronological walk over candidate meeting slots for one pair.
//!
//! [`CandidateSlots`] yields every slot start that passes the calendar rules
//! (weekday, weekly quota, preferred window, lunch, not in the past) in
//! order, interleaved with [`Step::DaySkipped`] markers for days that were
//! ruled out as a whole. It is finite and cheap to rebuild from the same
//! inputs; the availability check is left to the caller.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::pair::Pair;
use crate::quota::{WeeklyQuota, week_start};
use crate::window::{TimeWindow, WindowGap, WindowTable};

/// A concrete meeting interval, `end = start + meeting duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Organizer-local hours during which nothing is scheduled, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunchBreak {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for LunchBreak {
    fn default() -> Self {
        LunchBreak {
            start_hour: 12,
            end_hour: 14,
        }
    }
}

impl LunchBreak {
    pub fn contains(&self, local: NaiveTime) -> bool {
        (self.start_hour..self.end_hour).contains(&local.hour())
    }
}

/// Fixed parameters of the slot walk.
#[derive(Debug, Clone, Copy)]
pub struct SlotRules {
    pub meeting_duration: Duration,
    /// Distance between consecutive candidate starts.
    pub step: Duration,
    pub lunch: LunchBreak,
}

impl Default for SlotRules {
    fn default() -> Self {
        SlotRules {
            meeting_duration: Duration::minutes(20),
            step: Duration::minutes(30),
            lunch: LunchBreak::default(),
        }
    }
}

/// The dates searched: `days + 1` calendar days starting at `start`'s
/// organizer-local date. Slots before `start` itself are never offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    pub start: DateTime<Utc>,
    pub days: u32,
}

/// Why a day or a slot did not produce a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reason {
    WeeklyLimit { name: String, cap: u32 },
    NoWindow { a: String, b: String },
    NonexistentWindowStart { date: NaiveDate },
    Busy { at: DateTime<Tz> },
    BookingFailed(String),
    EmptyHorizon,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::WeeklyLimit { name, cap } => {
                write!(f, "{} exceeded weekly limit ({})", name, cap)
            }
            Reason::NoWindow { a, b } => {
                write!(f, "No overlapping time window between timezones {} and {}", a, b)
            }
            Reason::NonexistentWindowStart { date } => {
                write!(f, "Window start does not exist on {} (DST change)", date)
            }
            Reason::Busy { at } => {
                write!(f, "No mutual availability at {}", at.format("%Y-%m-%d %H:%M"))
            }
            Reason::BookingFailed(error) => write!(f, "Booking failed: {}", error),
            Reason::EmptyHorizon => write!(f, "No weekday inside the planning horizon"),
        }
    }
}

/// One item of the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A slot to check for availability.
    Slot(CandidateSlot),
    /// A whole day was ruled out before any slot was considered.
    DaySkipped { date: NaiveDate, reason: Reason },
}

struct DayCursor {
    date: NaiveDate,
    window: TimeWindow,
    next: DateTime<Tz>,
}

/// Iterator over the candidate slots of one pair. See the module docs.
pub struct CandidateSlots<'a> {
    pair: &'a Pair,
    table: &'a WindowTable,
    quota: &'a WeeklyQuota,
    rules: SlotRules,
    not_before: DateTime<Utc>,
    next_date: Option<NaiveDate>,
    last_date: NaiveDate,
    day: Option<DayCursor>,
}

impl<'a> CandidateSlots<'a> {
    pub fn new(
        pair: &'a Pair,
        table: &'a WindowTable,
        quota: &'a WeeklyQuota,
        rules: SlotRules,
        horizon: Horizon,
    ) -> Self {
        let first_date = horizon
            .start
            .with_timezone(&table.organizer_tz())
            .date_naive();

        CandidateSlots {
            pair,
            table,
            quota,
            rules,
            not_before: horizon.start,
            next_date: Some(first_date),
            last_date: first_date + Duration::days(i64::from(horizon.days)),
            day: None,
        }
    }

    /// Set up the slot cursor for `date`, or explain why the day is out.
    fn open_day(&mut self, date: NaiveDate) -> Option<Reason> {
        let capped = self.pair.member(self.quota.capped_group());
        if !self.quota.try_reserve(capped, week_start(date)) {
            return Some(Reason::WeeklyLimit {
                name: capped.name.clone(),
                cap: self.quota.cap(),
            });
        }

        let (tz_a, tz_b) = (&self.pair.a.timezone, &self.pair.b.timezone);
        match self.table.resolve(tz_a, tz_b, date) {
            Ok(span) => {
                self.day = Some(DayCursor {
                    date,
                    window: span.window,
                    next: span.start,
                });
                None
            }
            Err(WindowGap::Unsupported) => Some(Reason::NoWindow {
                a: tz_a.clone(),
                b: tz_b.clone(),
            }),
            Err(WindowGap::NonexistentStart) => Some(Reason::NonexistentWindowStart { date }),
        }
    }

    /// Next slot of the open day, closing the day once the window is done.
    fn next_in_day(&mut self) -> Option<CandidateSlot> {
        while let Some(cursor) = self.day.as_mut() {
            let local = cursor.next;

            if local.date_naive() != cursor.date || !cursor.window.admits(local.time()) {
                self.day = None;
                break;
            }

            cursor.next = local + self.rules.step;

            if self.rules.lunch.contains(local.time()) {
                continue;
            }

            let start = local.with_timezone(&Utc);
            if start < self.not_before {
                continue;
            }

            return Some(CandidateSlot {
                start,
                end: start + self.rules.meeting_duration,
            });
        }

        None
    }
}

impl Iterator for CandidateSlots<'_> {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        loop {
            if let Some(slot) = self.next_in_day() {
                return Some(Step::Slot(slot));
            }

            let date = self.next_date.filter(|d| *d <= self.last_date)?;
            self.next_date = date.succ_opt();

            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            if let Some(reason) = self.open_day(date) {
                return Some(Step::DaySkipped { date, reason });
            }
        }
    }
}
