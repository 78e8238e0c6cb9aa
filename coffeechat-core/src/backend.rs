//! Seams to the outside world: sessions, roster rows, and the calendar.
//!
//! The scheduler only talks to these traits. The shipped implementation is
//! [`crate::provider::ProviderBackend`], which forwards each call to a
//! provider binary; tests use in-memory fakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoffeeChatResult;
use crate::event::{BusyInterval, CreatedEvent, EventRequest};

/// Where the roster lives, e.g. a spreadsheet id and a cell range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSpec {
    pub source_id: String,
    pub range: String,
}

/// Yields a usable session, or fails with [`crate::CoffeeChatError::Auth`].
#[allow(async_fn_in_trait)]
pub trait SessionSource {
    /// Returns the authenticated account identifier.
    async fn session(&self) -> CoffeeChatResult<String>;
}

#[allow(async_fn_in_trait)]
pub trait RosterSource {
    async fn fetch_rows(&self, spec: &RosterSpec) -> CoffeeChatResult<Vec<Vec<String>>>;
}

#[allow(async_fn_in_trait)]
pub trait CalendarBackend {
    /// Busy intervals of `identity` within `[time_min, time_max)`, in UTC.
    async fn query_free_busy(
        &self,
        identity: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> CoffeeChatResult<Vec<BusyInterval>>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> CoffeeChatResult<CreatedEvent>;
}
