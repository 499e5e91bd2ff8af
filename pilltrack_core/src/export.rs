//! CSV rollup for archiving the reminder log.
//!
//! The dispatch sink appends reminders to a JSONL log; this module rolls
//! that log into a CSV history file atomically so the log stays small and
//! the history survives in a spreadsheet-friendly form.

use crate::{ReminderRequest, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    pill_id: String,
    title: String,
    body: String,
    repeat_seconds: u64,
    requested_at: String,
}

impl From<&ReminderRequest> for CsvRow {
    fn from(request: &ReminderRequest) -> Self {
        CsvRow {
            pill_id: request.pill_id.clone().unwrap_or_default(),
            title: request.title.clone(),
            body: request.body.clone(),
            repeat_seconds: request.repeat_seconds,
            requested_at: request.requested_at.to_rfc3339(),
        }
    }
}

/// Roll up the reminder log into CSV and archive the log atomically
///
/// The CSV is fsynced before the log is renamed to `.processed` (not
/// deleted), so a crash between the two steps loses nothing and manual
/// recovery stays possible. Returns the number of reminders processed.
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let requests = crate::notify::read_requests(log_path)?;

    if requests.is_empty() {
        tracing::info!("No reminders in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for request in &requests {
        writer.serialize(CsvRow::from(request))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} reminders to CSV", requests.len());

    let processed_path = log_path.with_extension("log.processed");
    std::fs::rename(log_path, &processed_path)?;

    tracing::info!("Archived reminder log to {:?}", processed_path);

    Ok(requests.len())
}

/// Clean up old processed reminder logs in a directory
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed log: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed logs", count);
    }

    Ok(count)
}
