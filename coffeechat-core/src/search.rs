//! Earliest mutually free slot for one pair.

use std::collections::HashSet;

use tracing::debug;

use crate::availability::AvailabilityOracle;
use crate::backend::CalendarBackend;
use crate::pair::Pair;
use crate::progress::Progress;
use crate::quota::WeeklyQuota;
use crate::slots::{CandidateSlot, CandidateSlots, Horizon, Reason, SlotRules, Step};
use crate::window::WindowTable;

/// Result of searching one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub slot: Option<CandidateSlot>,
    /// Why days/slots were passed over, deduplicated, first occurrence first.
    pub reasons: Vec<Reason>,
}

impl SearchOutcome {
    pub fn summary(&self) -> String {
        self.reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Walks a pair's candidate slots and returns the first one both people are free for.
pub struct SlotSearch<'a, B> {
    table: &'a WindowTable,
    rules: SlotRules,
    oracle: AvailabilityOracle<'a, B>,
}

impl<'a, B: CalendarBackend> SlotSearch<'a, B> {
    pub fn new(table: &'a WindowTable, rules: SlotRules, backend: &'a B) -> Self {
        SlotSearch {
            table,
            rules,
            oracle: AvailabilityOracle::new(backend),
        }
    }

    pub async fn find_slot<P: Progress + ?Sized>(
        &self,
        pair: &Pair,
        quota: &WeeklyQuota,
        horizon: Horizon,
        progress: &mut P,
    ) -> SearchOutcome {
        let mut reasons = Vec::new();
        let mut seen = HashSet::new();

        let contacts = pair.contacts();
        let steps = CandidateSlots::new(pair, self.table, quota, self.rules, horizon);

        for step in steps {
            match step {
                Step::DaySkipped { date, reason } => {
                    debug!(pair = %pair.key(), %date, %reason, "day skipped");
                    record(&mut reasons, &mut seen, reason);
                }
                Step::Slot(slot) => {
                    progress.slot_checked();

                    if self
                        .oracle
                        .is_free(&contacts, slot.start, self.rules.meeting_duration)
                        .await
                    {
                        return SearchOutcome {
                            slot: Some(slot),
                            reasons,
                        };
                    }

                    let at = slot.start.with_timezone(&self.table.organizer_tz());
                    record(&mut reasons, &mut seen, Reason::Busy { at });
                }
            }
        }

        if reasons.is_empty() {
            reasons.push(Reason::EmptyHorizon);
        }

        SearchOutcome {
            slot: None,
            reasons,
        }
    }
}

fn record(reasons: &mut Vec<Reason>, seen: &mut HashSet<Reason>, reason: Reason) {
    if seen.insert(reason.clone()) {
        reasons.push(reason);
    }
}
