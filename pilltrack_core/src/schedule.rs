//! Dose scheduler: pure time computations over a pill.
//!
//! Everything here is a function of `(pill, now)` with no I/O and no hidden
//! state. Callers (the engine, the CLI watch loop) re-evaluate these on a
//! fixed polling cadence and act on the results.

use crate::{Error, Pill, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Cadence at which callers re-evaluate due/expired checks.
///
/// The due check matches a remaining time of exactly 0h 0m, which is a
/// window of one minute (anything under a minute floors to 0h 0m). Polling
/// at the same one-minute cadence bounds reminder accuracy to one tick; a
/// coarser caller cadence can miss a boundary entirely.
pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;

/// Remaining time to the next dose, truncated to whole hours and minutes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remaining {
    pub hours: i64,
    pub minutes: i64,
}

impl Remaining {
    /// True when both components floor to zero, i.e. the dose is due within
    /// the current minute
    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// The pill's repeat period as a duration
///
/// Errors on a zero-length interval: such a pill has no well-defined next
/// dose and should have been rejected at validation.
pub fn interval(pill: &Pill) -> Result<Duration> {
    let ms = i64::from(pill.interval_hours) * MS_PER_HOUR
        + i64::from(pill.interval_minutes) * MS_PER_MINUTE;

    if ms <= 0 {
        return Err(Error::Config(format!(
            "pill '{}' has a zero-length dose interval",
            pill.name
        )));
    }

    Ok(Duration::milliseconds(ms))
}

/// Whether the course has ended
///
/// False whenever no end date is set. Monotonic in `now`: once a course
/// expires it stays expired.
pub fn is_expired(pill: &Pill, now: DateTime<Utc>) -> bool {
    match pill.end_date {
        Some(end) => now >= end,
        None => false,
    }
}

/// The next dose instant at or after `now`
///
/// Doses occur at `anchor + k * interval` for k = 0, 1, 2, ... The anchor
/// may be arbitrarily far in the past (app reopened after days), so missed
/// doses are fast-forwarded in one step rather than walked; only the next
/// upcoming instant matters for display and alerting. If `now` is at or
/// before the anchor, the next dose is the anchor itself. If `now` lands
/// exactly on a dose instant, that instant is returned (remaining 0h 0m).
pub fn next_dose_time(pill: &Pill, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let step = interval(pill)?;

    if now <= pill.anchor {
        return Ok(pill.anchor);
    }

    let elapsed_ms = (now - pill.anchor).num_milliseconds();
    let step_ms = step.num_milliseconds();
    // Ceiling division fast-forwards past every missed dose at once
    let steps = (elapsed_ms + step_ms - 1) / step_ms;

    Ok(pill.anchor + Duration::milliseconds(steps * step_ms))
}

/// Time until the next dose, truncated to whole hours and minutes
///
/// Never negative: `next_dose_time` is defined to be `>= now`.
pub fn remaining_time(pill: &Pill, now: DateTime<Utc>) -> Result<Remaining> {
    let next = next_dose_time(pill, now)?;
    let ms = (next - now).num_milliseconds();

    Ok(Remaining {
        hours: ms / MS_PER_HOUR,
        minutes: (ms % MS_PER_HOUR) / MS_PER_MINUTE,
    })
}

/// Whether a reminder should be requested at this polling check
///
/// Level-triggered: true iff reminders are enabled for the pill and the
/// remaining time is exactly 0h 0m right now. The caller is expected to
/// re-evaluate once per [`POLL_INTERVAL`].
pub fn due_for_reminder(pill: &Pill, now: DateTime<Utc>) -> Result<bool> {
    if !pill.notifications_enabled {
        return Ok(false);
    }

    Ok(remaining_time(pill, now)?.is_zero())
}
