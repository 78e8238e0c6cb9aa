//! Core of the coffeechat ecosystem.
//!
//! This crate holds everything except the terminal and the Google APIs:
//! - roster partitioning, candidate pairs and their ordering
//! - timezone windows, weekly quotas and the slot search
//! - the `Scheduler` that books a whole run and reports on it
//! - the JSON protocol and subprocess client for provider binaries

pub mod availability;
pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod pair;
pub mod progress;
pub mod protocol;
pub mod provider;
pub mod quota;
pub mod report;
pub mod roster;
pub mod scheduler;
pub mod search;
pub mod slots;
pub mod window;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{CoffeeChatError, CoffeeChatResult};
pub use progress::Progress;
pub use provider::ProviderBackend;
pub use report::{Booking, ScheduleReport};
pub use scheduler::{RunOptions, Scheduler};
