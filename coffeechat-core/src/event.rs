//! Calendar data exchanged with providers.
//!
//! These types are provider-neutral. Providers convert them into their own
//! API payloads and return what they created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A busy block reported by free/busy lookup, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Whether `[start, end)` intersects this interval.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// A reminder/alarm for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event to trigger
    pub minutes: i64,
}

/// Event transparency (busy/free status)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Transparency {
    /// Event blocks time on calendar (default)
    #[default]
    Opaque,
    /// Event does not block time (shows as free)
    Transparent,
}

/// An event to be created on the team calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Attendee identities (emails).
    pub attendees: Vec<String>,
    /// Popup reminders; the calendar's default reminders are never used.
    pub reminders: Vec<Reminder>,
    /// Send invitation emails to attendees.
    pub send_updates: bool,
    pub guests_can_modify: bool,
    #[serde(default)]
    pub transparency: Transparency,
}

/// What the provider returns after creating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}
