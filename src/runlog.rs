//! Durable per-run event log.
//!
//! Workflows write significant events through [`EventSink`]; the file-backed
//! [`RunLog`] flushes every line so an interrupted run still leaves a record.
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn prefix(&self) -> &'static str {
        match self {
            Level::Info => "",
            Level::Warn => "Warn: ",
            Level::Error => "Error: ",
        }
    }
}

/// Write-only sink for run events.
pub trait EventSink {
    fn record(&mut self, level: Level, message: &str);

    fn info(&mut self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&mut self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&mut self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// Append-only log file named after the run start time.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create `<dir>/<started_at>.log` and write the run banner.
    pub fn create(dir: &Path, workflow: &str, started_at: DateTime<Local>) -> io::Result<Self> {
        let path = dir.join(format!("{}.log", started_at.format("%Y-%m-%dT%H%M%S")));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut log = Self { path, file };
        log.write_line(&format!(
            "Running {} @{}",
            workflow,
            started_at.format("%Y-%m-%d %H:%M:%S")
        ))?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }
}

impl EventSink for RunLog {
    fn record(&mut self, level: Level, message: &str) {
        match level {
            Level::Info => info!("{}", message),
            Level::Warn => warn!("{}", message),
            Level::Error => error!("{}", message),
        }
        let line = format!("{}{}", level.prefix(), message);
        if let Err(err) = self.write_line(&line) {
            warn!(?err, path = %self.path.display(), "failed to write run log line");
        }
    }
}

/// In-memory sink; keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    pub events: Vec<(Level, String)>,
}

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|(level, msg)| format!("{}{}", level.prefix(), msg))
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events.iter().filter(|(l, _)| *l == level).count()
    }
}

impl EventSink for MemoryLog {
    fn record(&mut self, level: Level, message: &str) {
        self.events.push((level, message.to_string()));
    }
}
