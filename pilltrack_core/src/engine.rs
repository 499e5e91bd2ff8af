//! Per-tick evaluation of a user's pill list.
//!
//! One polling tick asks two questions of every pill: has the course ended,
//! and is a dose due right now. `evaluate` answers both as pure data; the
//! caller performs the side effects (delete expired records, hand due
//! reminders to the dispatch sink, tell the user a course has ended).

use crate::schedule;
use crate::{Pill, ReminderRequest};
use chrono::{DateTime, Utc};

/// Outcome of one polling tick over a pill list
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    /// Courses whose end date has passed; to be deleted from the store,
    /// with a one-time course-ended notice to the user
    pub expired: Vec<Pill>,
    /// Reminders due at this tick, ready for the dispatch sink
    pub due: Vec<ReminderRequest>,
}

/// Evaluate all pills at `now`
///
/// An expired course never produces a reminder, even if its dose grid says
/// one is due. A pill with a broken interval (which validation should have
/// kept out of the store) is logged and skipped rather than failing the
/// whole tick.
pub fn evaluate(pills: &[Pill], now: DateTime<Utc>, reminder_title: &str) -> Evaluation {
    let mut outcome = Evaluation::default();

    for pill in pills {
        if schedule::is_expired(pill, now) {
            tracing::info!("Course '{}' has ended", pill.name);
            outcome.expired.push(pill.clone());
            continue;
        }

        match schedule::due_for_reminder(pill, now) {
            Ok(true) => match ReminderRequest::for_pill(pill, reminder_title, now) {
                Ok(request) => outcome.due.push(request),
                Err(e) => tracing::warn!("Skipping reminder for '{}': {}", pill.name, e),
            },
            Ok(false) => {}
            Err(e) => tracing::warn!("Skipping due check for '{}': {}", pill.name, e),
        }
    }

    tracing::debug!(
        "Tick at {}: {} due, {} expired",
        now,
        outcome.due.len(),
        outcome.expired.len()
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const TITLE: &str = "Time to take your pill";

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    fn pill(name: &str, hours: u32) -> Pill {
        let mut pill = Pill::new(name, anchor(), 1);
        pill.id = Some(format!("id_{}", name));
        pill.interval_hours = hours;
        pill
    }

    #[test]
    fn test_due_pill_produces_reminder() {
        let pills = vec![pill("a", 1)];
        // Exactly on a dose boundary
        let now = anchor() + Duration::hours(2);

        let outcome = evaluate(&pills, now, TITLE);
        assert_eq!(outcome.due.len(), 1);
        assert_eq!(outcome.due[0].body, "a");
        assert_eq!(outcome.due[0].title, TITLE);
        assert!(outcome.expired.is_empty());
    }

    #[test]
    fn test_not_due_between_boundaries() {
        let pills = vec![pill("a", 1)];
        let now = anchor() + Duration::minutes(90);

        let outcome = evaluate(&pills, now, TITLE);
        assert!(outcome.due.is_empty());
        assert!(outcome.expired.is_empty());
    }

    #[test]
    fn test_expired_course_reported_and_never_due() {
        let mut expired = pill("done", 1);
        expired.end_date = Some(anchor() + Duration::hours(1));
        let pills = vec![expired];

        // On a dose boundary AND past the end date
        let now = anchor() + Duration::hours(2);

        let outcome = evaluate(&pills, now, TITLE);
        assert_eq!(outcome.expired.len(), 1);
        assert_eq!(outcome.expired[0].name, "done");
        assert!(outcome.due.is_empty());
    }

    #[test]
    fn test_disabled_notifications_skip_reminder() {
        let mut quiet = pill("quiet", 1);
        quiet.notifications_enabled = false;
        let pills = vec![quiet, pill("loud", 1)];
        let now = anchor() + Duration::hours(2);

        let outcome = evaluate(&pills, now, TITLE);
        assert_eq!(outcome.due.len(), 1);
        assert_eq!(outcome.due[0].body, "loud");
    }

    #[test]
    fn test_broken_interval_skipped_not_fatal() {
        let broken = pill("broken", 0);
        let pills = vec![broken, pill("ok", 1)];
        let now = anchor() + Duration::hours(2);

        let outcome = evaluate(&pills, now, TITLE);
        assert_eq!(outcome.due.len(), 1);
        assert_eq!(outcome.due[0].body, "ok");
    }

    #[test]
    fn test_empty_list() {
        let outcome = evaluate(&[], anchor(), TITLE);
        assert!(outcome.due.is_empty());
        assert!(outcome.expired.is_empty());
    }
}
