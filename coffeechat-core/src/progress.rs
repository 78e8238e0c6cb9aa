//! Run observer.
//!
//! The scheduler reports what it is doing through [`Progress`]; the CLI
//! renders it to the terminal. Every method has a no-op default.

use crate::error::CoffeeChatError;
use crate::pair::PairKey;
use crate::report::Booking;
use crate::roster::Roster;

pub trait Progress {
    fn roster_loaded(&mut self, _roster: &Roster) {}

    /// Called once per candidate slot handed to the availability check.
    fn slot_checked(&mut self) {}

    fn booked(&mut self, _booking: &Booking) {}

    fn booking_failed(&mut self, _pair: &PairKey, _error: &CoffeeChatError) {}

    fn reminder(&mut self, _booking: &Booking) {}
}

/// Discards every notification.
pub struct Silent;

impl Progress for Silent {}
