//! Terminal rendering for scheduler output.
//!
//! `Render` adds colored text to coffeechat-core types using owo_colors;
//! `ConsoleProgress` prints the run as it happens.

use std::io::{self, Write};

use coffeechat_core::error::CoffeeChatError;
use coffeechat_core::pair::PairKey;
use coffeechat_core::roster::Roster;
use coffeechat_core::{Booking, Progress, ScheduleReport};
use indicatif::ProgressBar;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Booking {
    fn render(&self) -> String {
        let line = if self.dry_run {
            self.describe().yellow().to_string()
        } else {
            self.describe().green().to_string()
        };

        match &self.link {
            Some(link) => format!("{}\n   {}", line, link.dimmed()),
            None => line,
        }
    }
}

impl Render for ScheduleReport {
    fn render(&self) -> String {
        let mut lines = vec![format!("Total events created: {}", self.events_created)];

        if let Some(date) = self.latest_event_date {
            lines.push(format!("Last event scheduled on: {}", date.format("%Y-%m-%d")));
        }

        lines.push(String::new());
        lines.push("=== Unfulfilled Pairings Summary ===".bold().to_string());
        for (pair, reason) in &self.unfulfilled {
            lines.push(format!("{} {} {}", "❌".red(), pair, format!("— {reason}").dimmed()));
        }
        lines.push(String::new());
        lines.push(format!("Total unfulfilled pairings: {}", self.total_unfulfilled()));

        lines.join("\n")
    }
}

/// Lines shown once the roster is in. The expected meeting count is
/// always reported, even when one group is empty.
fn roster_summary(roster: &Roster) -> Vec<String> {
    let expected = format!(
        "Expected total number of meetings (full pairing): {}",
        roster.expected_meetings()
    );

    if !roster.has_both_groups() {
        return vec![expected, "No valid groups found!".yellow().to_string()];
    }

    vec![
        format!(
            "Pairing: {} from group A x {} from group B",
            roster.group_a.len(),
            roster.group_b.len()
        ),
        expected,
    ]
}

/// Prints progress dots while slots are checked, and a line per booking.
pub struct ConsoleProgress {
    spinner: Option<ProgressBar>,
    /// A line of dots is open and needs a newline before the next message.
    dots: bool,
}

impl ConsoleProgress {
    pub fn new(spinner: ProgressBar) -> Self {
        ConsoleProgress {
            spinner: Some(spinner),
            dots: false,
        }
    }

    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.end_dots();
    }

    fn end_dots(&mut self) {
        if self.dots {
            println!();
            self.dots = false;
        }
    }
}

impl Progress for ConsoleProgress {
    fn roster_loaded(&mut self, roster: &Roster) {
        self.finish();

        for line in roster_summary(roster) {
            println!("{}", line);
        }
    }

    fn slot_checked(&mut self) {
        print!("{}", ".".dimmed());
        let _ = io::stdout().flush();
        self.dots = true;
    }

    fn booked(&mut self, booking: &Booking) {
        self.end_dots();
        println!("{}", booking.render());
    }

    fn booking_failed(&mut self, pair: &PairKey, error: &CoffeeChatError) {
        self.end_dots();
        println!("{}", format!("Could not book {}: {}", pair, error).red());
    }

    fn reminder(&mut self, booking: &Booking) {
        self.end_dots();
        println!("{}", booking.render());
    }
}
