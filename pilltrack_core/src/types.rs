//! Core domain types for the Pilltrack system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Pills (medication courses) and their dosing configuration
//! - The fixed colour palette
//! - Validation of user-entered pill fields

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// Colour Palette
// ============================================================================

/// User-assignable pill colour, drawn from a fixed palette
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PillColor {
    Yellow,
    Red,
    Green,
    Blue,
    Pink,
    Cyan,
}

/// Palette table: colour, hex value, display name
static PALETTE: Lazy<Vec<(PillColor, &'static str, &'static str)>> = Lazy::new(|| {
    vec![
        (PillColor::Yellow, "#FFFF00", "Yellow"),
        (PillColor::Red, "#FF0000", "Red"),
        (PillColor::Green, "#00FF00", "Green"),
        (PillColor::Blue, "#0000FF", "Blue"),
        (PillColor::Pink, "#FF00EF", "Pink"),
        (PillColor::Cyan, "#00FFFF", "Cyan"),
    ]
});

impl PillColor {
    /// Hex value for display layers
    pub fn hex(&self) -> &'static str {
        PALETTE
            .iter()
            .find(|(c, _, _)| c == self)
            .map(|(_, hex, _)| *hex)
            .unwrap_or("#FFFF00")
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        PALETTE
            .iter()
            .find(|(c, _, _)| c == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("Yellow")
    }

    /// Parse a colour by name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        PALETTE
            .iter()
            .find(|(_, _, name)| name.to_lowercase() == lower)
            .map(|(c, _, _)| *c)
    }

    /// All palette entries in display order
    pub fn all() -> Vec<PillColor> {
        PALETTE.iter().map(|(c, _, _)| *c).collect()
    }
}

impl Default for PillColor {
    fn default() -> Self {
        PillColor::Yellow
    }
}

// ============================================================================
// Pill Type
// ============================================================================

/// A tracked medication course with a dosing interval
///
/// Created with `id = None` when the user adds a pill; the store assigns an
/// id on first successful save. The `anchor` is the reference instant from
/// which dose times are computed by repeated interval addition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pill {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub interval_hours: u32,
    pub interval_minutes: u32,
    pub anchor: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub order: u32,
    #[serde(default)]
    pub color: PillColor,
    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,
}

fn default_notifications_enabled() -> bool {
    true
}

impl Pill {
    /// Create a pill with defaults, anchored at `now`
    ///
    /// `order` should be one past the user's current maximum (first pill
    /// gets 1).
    pub fn new(name: impl Into<String>, now: DateTime<Utc>, order: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            notes: String::new(),
            interval_hours: 0,
            interval_minutes: 0,
            anchor: now,
            start_date: now,
            end_date: None,
            order,
            color: PillColor::default(),
            notifications_enabled: true,
        }
    }

    /// Validate user-entered fields
    ///
    /// Rejects an empty name, a zero-length interval, and an end date before
    /// the start date. Must pass before a pill enters the store or the dose
    /// scheduler.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::Validation("pill name must not be empty".into()));
        }

        if self.interval_hours == 0 && self.interval_minutes == 0 {
            return Err(crate::Error::Validation(
                "dose interval must be at least one minute".into(),
            ));
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(crate::Error::Validation(format!(
                    "end date {} is before start date {}",
                    end, self.start_date
                )));
            }
        }

        Ok(())
    }
}

/// Sort pills by `order`, stable so duplicate orders keep insertion order
pub fn sort_pills(pills: &mut [Pill]) {
    pills.sort_by_key(|p| p.order);
}
