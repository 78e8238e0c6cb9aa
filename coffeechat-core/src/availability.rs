//! Free/busy as a yes/no answer.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::backend::CalendarBackend;

/// Answers "is everybody free for this interval" from the calendar backend.
///
/// Fails closed: a backend error for any identity counts as busy.
pub struct AvailabilityOracle<'a, B> {
    backend: &'a B,
}

impl<'a, B: CalendarBackend> AvailabilityOracle<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        AvailabilityOracle { backend }
    }

    pub async fn is_free(&self, identities: &[&str], start: DateTime<Utc>, duration: Duration) -> bool {
        let end = start + duration;

        for identity in identities {
            let busy = match self.backend.query_free_busy(identity, start, end).await {
                Ok(busy) => busy,
                Err(e) => {
                    warn!(identity, %start, error = %e, "free/busy lookup failed, treating as busy");
                    return false;
                }
            };

            debug!(identity, %start, %end, intervals = busy.len(), "free/busy result");

            if busy.iter().any(|interval| interval.overlaps(start, end)) {
                debug!(identity, %start, "busy during candidate slot");
                return false;
            }
        }

        true
    }
}
