//! In-memory backend for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::backend::{CalendarBackend, RosterSource, RosterSpec, SessionSource};
use crate::error::{CoffeeChatError, CoffeeChatResult};
use crate::event::{BusyInterval, CreatedEvent, EventRequest};

#[derive(Default)]
struct State {
    busy: HashMap<String, Vec<BusyInterval>>,
    failing_free_busy: HashSet<String>,
    failing_inserts: HashSet<String>,
    free_busy_calls: usize,
    inserted: Vec<(String, EventRequest)>,
    rows: Vec<Vec<String>>,
    roster_requests: Vec<RosterSpec>,
    session_error: Option<String>,
}

/// Fake session, roster and calendar in one.
#[derive(Default)]
pub struct FakeCalendar {
    state: Mutex<State>,
}

impl FakeCalendar {
    pub fn with_rows(rows: &[[&str; 4]]) -> Self {
        let calendar = FakeCalendar::default();
        calendar.state.lock().unwrap().rows = rows
            .iter()
            .map(|row| row.iter().map(|f| f.to_string()).collect())
            .collect();
        calendar
    }

    pub fn add_busy(&self, identity: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.state
            .lock()
            .unwrap()
            .busy
            .entry(identity.to_string())
            .or_default()
            .push(BusyInterval { start, end });
    }

    pub fn fail_free_busy_for(&self, identity: &str) {
        self.state.lock().unwrap().failing_free_busy.insert(identity.to_string());
    }

    /// Inserts with `attendee` among the attendees fail.
    pub fn fail_inserts_for(&self, attendee: &str) {
        self.state.lock().unwrap().failing_inserts.insert(attendee.to_string());
    }

    pub fn fail_session(&self, message: &str) {
        self.state.lock().unwrap().session_error = Some(message.to_string());
    }

    pub fn free_busy_calls(&self) -> usize {
        self.state.lock().unwrap().free_busy_calls
    }

    pub fn inserted(&self) -> Vec<(String, EventRequest)> {
        self.state.lock().unwrap().inserted.clone()
    }

    pub fn roster_requests(&self) -> Vec<RosterSpec> {
        self.state.lock().unwrap().roster_requests.clone()
    }
}

impl SessionSource for FakeCalendar {
    async fn session(&self) -> CoffeeChatResult<String> {
        match &self.state.lock().unwrap().session_error {
            Some(message) => Err(CoffeeChatError::Auth(message.clone())),
            None => Ok("organizer@example.com".to_string()),
        }
    }
}

impl RosterSource for FakeCalendar {
    async fn fetch_rows(&self, spec: &RosterSpec) -> CoffeeChatResult<Vec<Vec<String>>> {
        let mut state = self.state.lock().unwrap();
        state.roster_requests.push(spec.clone());
        Ok(state.rows.clone())
    }
}

impl CalendarBackend for FakeCalendar {
    async fn query_free_busy(
        &self,
        identity: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> CoffeeChatResult<Vec<BusyInterval>> {
        let mut state = self.state.lock().unwrap();
        state.free_busy_calls += 1;

        if state.failing_free_busy.contains(identity) {
            return Err(CoffeeChatError::Backend(format!("freeBusy failed for {identity}")));
        }

        Ok(state
            .busy
            .get(identity)
            .map(|intervals| {
                intervals
                    .iter()
                    .filter(|b| b.overlaps(time_min, time_max))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> CoffeeChatResult<CreatedEvent> {
        let mut state = self.state.lock().unwrap();

        if event.attendees.iter().any(|a| state.failing_inserts.contains(a)) {
            return Err(CoffeeChatError::Backend("insert rejected".to_string()));
        }

        state.inserted.push((calendar_id.to_string(), event.clone()));
        let id = format!("evt-{}", state.inserted.len());

        Ok(CreatedEvent {
            html_link: Some(format!("https://calendar.example.com/{id}")),
            id,
        })
    }
}
