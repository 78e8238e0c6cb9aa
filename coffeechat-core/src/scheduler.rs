//! The pairing run: roster in, calendar events and a report out.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::backend::{CalendarBackend, RosterSource, SessionSource};
use crate::config::Config;
use crate::error::CoffeeChatResult;
use crate::event::{EventRequest, Reminder, Transparency};
use crate::pair::{Pair, PairOrder, candidate_pairs};
use crate::progress::Progress;
use crate::quota::week_start;
use crate::report::{Booking, ScheduleReport};
use crate::roster::Roster;
use crate::search::SlotSearch;
use crate::slots::{CandidateSlot, Horizon, Reason};

/// Per-invocation switches.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Simulate bookings without calling the calendar.
    pub dry_run: bool,
    /// Send invitation emails to attendees.
    pub send_email: bool,
    pub pair_order: PairOrder,
    /// Start of the planning horizon.
    pub now: DateTime<Utc>,
}

impl RunOptions {
    pub fn new(config: &Config) -> Self {
        RunOptions {
            dry_run: false,
            send_email: true,
            pair_order: config.pair_order(),
            now: Utc::now(),
        }
    }
}

pub struct Scheduler<'a, B> {
    config: &'a Config,
    backend: &'a B,
    options: RunOptions,
}

impl<'a, B> Scheduler<'a, B>
where
    B: SessionSource + RosterSource + CalendarBackend,
{
    pub fn new(config: &'a Config, backend: &'a B, options: RunOptions) -> Self {
        Scheduler {
            config,
            backend,
            options,
        }
    }

    /// Run once, start to finish.
    ///
    /// Only a failed session or roster fetch is an error; everything that
    /// goes wrong for a single pair ends up in the report instead.
    pub async fn run<P: Progress + ?Sized>(&self, progress: &mut P) -> CoffeeChatResult<ScheduleReport> {
        let account = self.backend.session().await?;
        info!(account, "session ready");

        let rows = self.backend.fetch_rows(&self.config.roster_spec()).await?;
        let roster = Roster::partition(&rows, &self.config.roster.labels);
        info!(
            rows = rows.len(),
            group_a = roster.group_a.len(),
            group_b = roster.group_b.len(),
            "roster loaded"
        );
        progress.roster_loaded(&roster);

        let mut report = ScheduleReport {
            expected_meetings: roster.expected_meetings(),
            ..ScheduleReport::default()
        };

        if !roster.has_both_groups() {
            warn!("no valid groups, nothing to schedule");
            return Ok(report);
        }

        let mut pairs = candidate_pairs(&roster);
        self.options.pair_order.apply(&mut pairs);

        let tz = self.config.organizer_timezone;
        let table = self.config.window_table();
        let search = SlotSearch::new(&table, self.config.slot_rules(), self.backend);
        let mut quota = self.config.quota();
        let horizon = Horizon {
            start: self.options.now,
            days: self.config.schedule.horizon_days,
        };

        for pair in &pairs {
            let key = pair.key();
            let outcome = search.find_slot(pair, &quota, horizon, &mut *progress).await;

            let Some(slot) = outcome.slot else {
                debug!(pair = %key, reasons = outcome.reasons.len(), "no slot found");
                report.unfulfilled.insert(key, outcome.summary());
                continue;
            };

            let link = if self.options.dry_run {
                None
            } else {
                match self
                    .backend
                    .insert_event(&self.config.calendar_id, &self.pair_event(pair, slot))
                    .await
                {
                    Ok(created) => created.html_link,
                    Err(e) => {
                        warn!(pair = %key, error = %e, "booking failed, skipping pair");
                        progress.booking_failed(&key, &e);
                        report
                            .unfulfilled
                            .insert(key, Reason::BookingFailed(e.to_string()).to_string());
                        continue;
                    }
                }
            };

            let local_start = slot.start.with_timezone(&tz);
            let date = local_start.date_naive();
            quota.commit(pair.member(quota.capped_group()), week_start(date));
            report.events_created += 1;
            report.saw_date(date);

            let booking = Booking {
                number: report.events_created,
                title: format!("{} ↔ {}", pair.a.name, pair.b.name),
                slot,
                local_start,
                dry_run: self.options.dry_run,
                link,
            };
            info!(pair = %key, start = %local_start, dry_run = self.options.dry_run, "booked");
            progress.booked(&booking);
            report.bookings.push(booking);
        }

        if let Some(date) = report.latest_event_date {
            report.reminder = self.book_reminder(date, report.events_created + 1, progress).await;
        }

        Ok(report)
    }

    fn pair_event(&self, pair: &Pair, slot: CandidateSlot) -> EventRequest {
        let event = &self.config.event;
        EventRequest {
            summary: event.summary.clone(),
            description: Some(event.description.clone()),
            start: slot.start,
            end: slot.end,
            attendees: pair.contacts().iter().map(|c| c.to_string()).collect(),
            reminders: vec![Reminder {
                minutes: event.reminder_minutes,
            }],
            send_updates: self.options.send_email,
            guests_can_modify: true,
            transparency: Transparency::Opaque,
        }
    }

    /// The organizer's heads-up on the day of the last meeting. Not subject
    /// to availability or quota; failures are logged and otherwise ignored.
    async fn book_reminder<P: Progress + ?Sized>(
        &self,
        date: NaiveDate,
        number: usize,
        progress: &mut P,
    ) -> Option<Booking> {
        let tz = self.config.organizer_timezone;
        let event = &self.config.event;

        let Some(local_start) = date
            .and_hms_opt(event.reminder_hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        else {
            warn!(%date, hour = event.reminder_hour, "reminder time does not exist, skipping reminder");
            return None;
        };

        let start = local_start.with_timezone(&Utc);
        let slot = CandidateSlot {
            start,
            end: start + event.reminder_duration,
        };

        let link = if self.options.dry_run {
            None
        } else {
            let request = EventRequest {
                summary: event.reminder_summary.clone(),
                description: Some(event.reminder_description.clone()),
                start: slot.start,
                end: slot.end,
                attendees: vec![self.config.organizer_email.clone()],
                reminders: vec![Reminder {
                    minutes: event.reminder_minutes,
                }],
                send_updates: self.options.send_email,
                guests_can_modify: true,
                transparency: Transparency::Opaque,
            };

            match self.backend.insert_event(&self.config.calendar_id, &request).await {
                Ok(created) => created.html_link,
                Err(e) => {
                    warn!(error = %e, "could not create organizer reminder");
                    return None;
                }
            }
        };

        let booking = Booking {
            number,
            title: format!("organizer reminder for {}", self.config.organizer_email),
            slot,
            local_start,
            dry_run: self.options.dry_run,
            link,
        };
        progress.reminder(&booking);
        Some(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::CoffeeChatError;
    use crate::progress::Silent;
    use crate::testing::FakeCalendar;
    use chrono::{Datelike, Duration, Timelike, Weekday};
    use chrono_tz::Europe::Paris;

    fn config() -> Config {
        let mut config = Config::default();
        config.organizer_email = "lead@example.com".to_string();
        config.calendar_id = "team@example.com".to_string();
        config.roster.spreadsheet_id = "sheet-1".to_string();
        config
    }

    /// Monday 2025-06-02, 00:00 Paris.
    fn monday() -> DateTime<Utc> {
        Paris
            .with_ymd_and_hms(2025, 6, 2, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn options(dry_run: bool, pair_order: PairOrder) -> RunOptions {
        RunOptions {
            dry_run,
            send_email: true,
            pair_order,
            now: monday(),
        }
    }

    async fn run(calendar: &FakeCalendar, options: RunOptions) -> CoffeeChatResult<ScheduleReport> {
        let config = config();
        Scheduler::new(&config, calendar, options).run(&mut Silent).await
    }

    #[tokio::test]
    async fn paris_boston_books_first_weekday_at_window_start() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
        ]);

        let report = run(&calendar, options(false, PairOrder::Identity)).await.unwrap();

        assert_eq!(report.expected_meetings, 1);
        assert_eq!(report.events_created, 1);
        assert!(report.unfulfilled.is_empty());
        assert_eq!(
            report.bookings[0].local_start,
            Paris.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap()
        );
        assert_eq!(report.bookings[0].title, "Alice ↔ Bob");
        assert_eq!(report.bookings[0].link.as_deref(), Some("https://calendar.example.com/evt-1"));
        assert_eq!(report.latest_event_date, NaiveDate::from_ymd_opt(2025, 6, 2));

        let inserted = calendar.inserted();
        assert_eq!(inserted.len(), 2);

        let (calendar_id, event) = &inserted[0];
        assert_eq!(calendar_id, "team@example.com");
        assert_eq!(event.attendees, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(event.end - event.start, Duration::minutes(20));
        assert_eq!(event.reminders, vec![Reminder { minutes: 10 }]);
        assert!(event.send_updates);
        assert!(event.guests_can_modify);
        assert_eq!(event.transparency, Transparency::Opaque);

        assert_eq!(calendar.roster_requests()[0].source_id, "sheet-1");
    }

    #[tokio::test]
    async fn organizer_reminder_on_latest_date() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
        ]);

        let report = run(&calendar, options(false, PairOrder::Identity)).await.unwrap();

        let reminder = report.reminder.unwrap();
        assert_eq!(reminder.local_start, Paris.with_ymd_and_hms(2025, 6, 2, 17, 0, 0).unwrap());
        assert_eq!(reminder.slot.end - reminder.slot.start, Duration::minutes(30));
        assert_eq!(reminder.title, "organizer reminder for lead@example.com");

        let (_, event) = &calendar.inserted()[1];
        assert_eq!(event.summary, "⏰ Coffee Chat Prep Reminder");
        assert_eq!(event.attendees, vec!["lead@example.com"]);
        // The reminder is not a meeting.
        assert_eq!(report.events_created, 1);
    }

    #[tokio::test]
    async fn always_busy_pair_is_reported_once() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
        ]);
        calendar.add_busy("bob@example.com", monday(), monday() + Duration::days(120));

        let report = run(&calendar, options(false, PairOrder::Identity)).await.unwrap();

        assert_eq!(report.events_created, 0);
        assert_eq!(report.total_unfulfilled(), 1);
        let reason = report.unfulfilled.values().next().unwrap();
        assert!(reason.starts_with("No mutual availability at 2025-06-02 15:00"));
        assert!(report.reminder.is_none());
        assert!(calendar.inserted().is_empty());
    }

    #[tokio::test]
    async fn capped_week_is_skipped_without_availability_checks() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
            ["Carol", "group2", "carol@example.com", "Boston"],
            ["Dan", "group2", "dan@example.com", "Boston"],
        ]);

        let report = run(&calendar, options(true, PairOrder::Identity)).await.unwrap();

        assert_eq!(report.events_created, 3);
        let dates: Vec<_> = report.bookings.iter().map(|b| b.local_start.date_naive()).collect();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        // Alice is at her cap for the first week, so Dan waits for the next Monday.
        assert_eq!(dates[2], NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
        // Two identities per checked slot, one slot per pair.
        assert_eq!(calendar.free_busy_calls(), 6);
    }

    #[tokio::test]
    async fn dry_run_matches_live_run_without_inserts() {
        let rows = [
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Erin", "group1", "erin@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
            ["Carol", "group2", "carol@example.com", "Seattle"],
            ["Dan", "group2", "dan@example.com", "Chicago"],
        ];
        let live_calendar = FakeCalendar::with_rows(&rows);
        let dry_calendar = FakeCalendar::with_rows(&rows);
        for calendar in [&live_calendar, &dry_calendar] {
            calendar.add_busy("bob@example.com", monday(), monday() + Duration::days(2));
        }

        let live = run(&live_calendar, options(false, PairOrder::Seeded(11))).await.unwrap();
        let dry = run(&dry_calendar, options(true, PairOrder::Seeded(11))).await.unwrap();

        let slots = |r: &ScheduleReport| -> Vec<_> {
            r.bookings.iter().map(|b| (b.title.clone(), b.slot)).collect()
        };
        assert_eq!(slots(&live), slots(&dry));
        assert_eq!(live.events_created, dry.events_created);
        assert_eq!(live.latest_event_date, dry.latest_event_date);
        assert_eq!(live.unfulfilled, dry.unfulfilled);
        assert!(dry.reminder.is_some());

        assert!(dry_calendar.inserted().is_empty());
        assert_eq!(live_calendar.inserted().len(), live.events_created + 1);
        assert!(dry.bookings[0].describe().starts_with("[Dry Run 1] Would schedule: "));
    }

    #[tokio::test]
    async fn booking_failure_abandons_pair_and_keeps_quota() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Boston"],
            ["Carol", "group2", "carol@example.com", "Boston"],
        ]);
        calendar.fail_inserts_for("bob@example.com");

        let mut config = config();
        config.schedule.weekly_cap = 1;
        let report = Scheduler::new(&config, &calendar, options(false, PairOrder::Identity))
            .run(&mut Silent)
            .await
            .unwrap();

        assert_eq!(report.events_created, 1);
        assert_eq!(report.bookings[0].title, "Alice ↔ Carol");
        // Bob's failed booking did not use up Alice's only slot this week.
        assert_eq!(report.bookings[0].local_start.date_naive(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        let reason = &report.unfulfilled[&crate::pair::PairKey::new("Alice", "Bob")];
        assert_eq!(reason, "Booking failed: Calendar backend error: insert rejected");
    }

    #[tokio::test]
    async fn bookings_respect_calendar_rules_and_caps() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Erin", "group1", "erin@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Paris"],
            ["Carol", "group2", "carol@example.com", "Paris"],
            ["Dan", "group2", "dan@example.com", "Seattle"],
            ["Finn", "group2", "finn@example.com", "Boston"],
            ["Gus", "group2", "gus@example.com", "Chicago"],
        ]);
        calendar.add_busy("carol@example.com", monday(), monday() + Duration::hours(40));

        let report = run(&calendar, options(true, PairOrder::Seeded(3))).await.unwrap();

        assert_eq!(report.events_created, 10);
        let mut per_week: HashMap<(String, NaiveDate), u32> = HashMap::new();
        for booking in &report.bookings {
            let local = booking.local_start;
            assert!(!matches!(local.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(!(12..14).contains(&local.hour()));
            let capped = booking.title.split(" ↔ ").next().unwrap().to_string();
            *per_week.entry((capped, week_start(local.date_naive()))).or_default() += 1;
        }
        assert!(per_week.values().all(|&n| n <= 2));
    }

    #[tokio::test]
    async fn no_email_suppresses_invitations() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group2", "bob@example.com", "Paris"],
        ]);
        let mut options = options(false, PairOrder::Identity);
        options.send_email = false;

        run(&calendar, options).await.unwrap();

        assert!(calendar.inserted().iter().all(|(_, event)| !event.send_updates));
    }

    #[tokio::test]
    async fn auth_failure_stops_before_roster() {
        let calendar = FakeCalendar::with_rows(&[["Alice", "group1", "alice@example.com", "Paris"]]);
        calendar.fail_session("token expired");

        let err = run(&calendar, options(false, PairOrder::Identity)).await.unwrap_err();

        assert!(matches!(err, CoffeeChatError::Auth(_)));
        assert!(calendar.roster_requests().is_empty());
    }

    #[tokio::test]
    async fn single_group_roster_schedules_nothing() {
        let calendar = FakeCalendar::with_rows(&[
            ["Alice", "group1", "alice@example.com", "Paris"],
            ["Bob", "group3", "bob@example.com", "Boston"],
        ]);

        let report = run(&calendar, options(false, PairOrder::Identity)).await.unwrap();

        assert_eq!(report.expected_meetings, 0);
        assert_eq!(report.events_created, 0);
        assert!(report.unfulfilled.is_empty());
        assert_eq!(calendar.free_busy_calls(), 0);
    }
}
