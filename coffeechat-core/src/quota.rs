//! Weekly meeting caps for the capped group.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::roster::{Group, Person};

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Counts meetings per (person, week) for members of one group.
///
/// People outside the capped group are never limited and never counted.
#[derive(Debug, Clone)]
pub struct WeeklyQuota {
    capped: Group,
    cap: u32,
    counts: HashMap<(String, NaiveDate), u32>,
}

impl WeeklyQuota {
    pub fn new(capped: Group, cap: u32) -> Self {
        WeeklyQuota {
            capped,
            cap,
            counts: HashMap::new(),
        }
    }

    pub fn capped_group(&self) -> Group {
        self.capped
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn count(&self, name: &str, week: NaiveDate) -> u32 {
        self.counts
            .get(&(name.to_string(), week))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `person` may take another meeting in `week`. Never mutates.
    pub fn try_reserve(&self, person: &Person, week: NaiveDate) -> bool {
        person.group != self.capped || self.count(&person.name, week) < self.cap
    }

    /// Record a booked meeting. Call only after the booking went through.
    pub fn commit(&mut self, person: &Person, week: NaiveDate) {
        if person.group == self.capped {
            *self.counts.entry((person.name.clone(), week)).or_insert(0) += 1;
        }
    }
}
