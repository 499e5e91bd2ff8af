//! Reminder dispatch boundary.
//!
//! The scheduler decides *when* a reminder is due; delivery belongs to an
//! external notification service. `ReminderSink` is that boundary, and
//! `JsonlSink` is the file-backed implementation: each dispatched request is
//! appended as a JSON line with file locking, giving rollup a durable record.

use crate::{Pill, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A request handed to the notification service
///
/// `repeat_seconds` carries the pill's interval so the service can arm a
/// recurring trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub pill_id: Option<String>,
    pub title: String,
    pub body: String,
    pub repeat_seconds: u64,
    pub requested_at: DateTime<Utc>,
}

impl ReminderRequest {
    /// Build a reminder request for a due pill
    pub fn for_pill(pill: &Pill, title: &str, now: DateTime<Utc>) -> Result<Self> {
        let step = crate::schedule::interval(pill)?;

        Ok(Self {
            pill_id: pill.id.clone(),
            title: title.to_string(),
            body: pill.name.clone(),
            repeat_seconds: step.num_seconds() as u64,
            requested_at: now,
        })
    }
}

/// Reminder sink trait for dispatching requests
pub trait ReminderSink {
    fn dispatch(&mut self, request: &ReminderRequest) -> Result<()>;
}

/// JSONL-based reminder sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ReminderSink for JsonlSink {
    fn dispatch(&mut self, request: &ReminderRequest) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(request)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Dispatched reminder for '{}'", request.body);
        Ok(())
    }
}

/// Read all reminder requests from a log file
///
/// Unparsable lines are skipped with a warning rather than failing the read.
pub fn read_requests(path: &Path) -> Result<Vec<ReminderRequest>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut requests = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ReminderRequest>(&line) {
            Ok(request) => requests.push(request),
            Err(e) => {
                tracing::warn!("Failed to parse reminder at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} reminders from log", requests.len());
    Ok(requests)
}
