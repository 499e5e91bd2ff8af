#![forbid(unsafe_code)]

//! Core domain model and business logic for the Pilltrack system.
//!
//! This crate provides:
//! - Domain types (pills, colours, reminder requests)
//! - The dose scheduler (pure time computations)
//! - Per-tick evaluation (due reminders, expired courses)
//! - Collaborator boundaries (pill store, session store, reminder sink)
//! - Reminder log rollup to CSV

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod engine;
pub mod store;
pub mod session;
pub mod notify;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::{sort_pills, Pill, PillColor};
pub use config::Config;
pub use schedule::{
    due_for_reminder, is_expired, next_dose_time, remaining_time, Remaining, POLL_INTERVAL,
};
pub use engine::{evaluate, Evaluation};
pub use store::{JsonStore, PillStore};
pub use session::{FileSessionStore, SessionStore};
pub use notify::{JsonlSink, ReminderRequest, ReminderSink};
