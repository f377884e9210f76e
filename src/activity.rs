//! Activity log
//!
//! The operator-facing record of what the monitor did: one line per sample and
//! one line per escalation outcome. Lines are appended to a file as
//! `<timestamp> - <message>` and mirrored to stdout without the timestamp.
//!
//! This is independent of the `tracing` diagnostics on stderr, although every
//! entry is forwarded there as well.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

pub trait ActivityLog: Send {
    /// Append a timestamped line to the log and print it.
    fn log(&mut self, severity: Severity, message: &str);

    /// Print to the console only.
    fn announce(&mut self, message: &str);
}

pub fn format_line(timestamp: DateTime<Local>, message: &str) -> String {
    format!("{} - {message}", timestamp.format(TIMESTAMP_FORMAT))
}

#[derive(Debug)]
pub struct FileActivityLog {
    file: File,
    path: PathBuf,
    mirror_to_stdout: bool,
}

impl FileActivityLog {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mirror_to_stdout: true,
        })
    }

    /// Keep lines out of stdout.
    pub fn quiet(mut self) -> Self {
        self.mirror_to_stdout = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivityLog for FileActivityLog {
    fn log(&mut self, severity: Severity, message: &str) {
        forward(severity, message);

        let line = format_line(Local::now(), message);
        if let Err(e) = writeln!(self.file, "{line}") {
            warn!("failed to write to {}: {e}", self.path.display());
        }

        if self.mirror_to_stdout {
            println!("{message}");
        }
    }

    fn announce(&mut self, message: &str) {
        if self.mirror_to_stdout {
            println!("{message}");
        }
    }
}

fn forward(severity: Severity, message: &str) {
    match severity {
        Severity::Info => info!("{message}"),
        Severity::Error => error!("{message}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Logged { severity: Severity, message: String },
    Announced(String),
}

/// Keeps entries in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryActivityLog {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages that went to the log file, in order.
    pub fn logged(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Logged { message, .. } => Some(message),
                Entry::Announced(_) => None,
            })
            .collect()
    }

    fn push(&self, entry: Entry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

impl ActivityLog for MemoryActivityLog {
    fn log(&mut self, severity: Severity, message: &str) {
        forward(severity, message);
        self.push(Entry::Logged {
            severity,
            message: message.to_string(),
        });
    }

    fn announce(&mut self, message: &str) {
        self.push(Entry::Announced(message.to_string()));
    }
}
