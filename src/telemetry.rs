//! Local notice log
//!
//! Appends one JSON object per user-facing notice to a JSONL file so that
//! recurring problems (painting on locked layers, empty animations) can be
//! counted later. Nothing is written unless collection is enabled.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Notice, NoticeKind};

/// One line of the notice log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeEntry {
    /// UTC timestamp, `YYYY-MM-DDTHH:MM:SSZ`
    pub timestamp: String,
    /// Command that raised the notice (e.g. "paint", "preview")
    pub command: String,
    /// Project file being edited, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub kind: NoticeKind,
    /// Notice text as shown to the user
    pub context: String,
}

impl NoticeEntry {
    pub fn new(command: impl Into<String>, notice: &Notice) -> Self {
        Self {
            timestamp: utc_timestamp(),
            command: command.into(),
            file: None,
            kind: notice.kind,
            context: notice.message.clone(),
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Current time formatted as ISO 8601 UTC.
fn utc_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format_timestamp(secs)
}

fn format_timestamp(unix_secs: u64) -> String {
    let days = (unix_secs / 86_400) as i64;
    let of_day = unix_secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Appends notices to a JSONL file
#[derive(Debug, Clone)]
pub struct NoticeLog {
    path: PathBuf,
    enabled: bool,
}

impl NoticeLog {
    pub fn new(path: impl AsRef<Path>, enabled: bool) -> Self {
        Self { path: path.as_ref().to_path_buf(), enabled }
    }

    /// A log that never writes.
    pub fn disabled() -> Self {
        Self { path: PathBuf::new(), enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. A no-op when disabled.
    pub fn append(&self, entry: &NoticeEntry) -> std::io::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        writeln!(writer, "{}", json)?;
        writer.flush()
    }

    /// Turn an engine error into its notice, record it, and return the notice.
    ///
    /// Write failures are logged and otherwise ignored; the notice is still
    /// returned for display.
    pub fn report(&self, command: &str, file: Option<&str>, error: &EngineError) -> Notice {
        let notice = error.to_notice();
        let mut entry = NoticeEntry::new(command, &notice);
        if let Some(f) = file {
            entry = entry.with_file(f);
        }
        if let Err(e) = self.append(&entry) {
            log::warn!("could not write notice log {}: {}", self.path.display(), e);
        }
        notice
    }
}
