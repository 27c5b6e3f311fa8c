//! Append-only audit log of a chat session
//!
//! One JSON object per line, one line per user turn, bot turn, and error.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionLogError {
    #[error("Session log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session log encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Exit,
    Interrupted,
    Eof,
    /// Reading the terminal or writing to it failed
    IoError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStart {
        brand: String,
        model: String,
    },
    User {
        text: String,
    },
    Bot {
        text: String,
        source: &'static str,
    },
    Error {
        message: String,
        kind: &'static str,
        retryable: bool,
    },
    SessionEnd {
        reason: EndReason,
    },
}

impl LogEvent {
    pub fn level(&self) -> &'static str {
        match self {
            LogEvent::Error { .. } => "ERROR",
            _ => "INFO",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: &'static str,
    #[serde(flatten)]
    pub event: LogEvent,
}

impl LogRecord {
    pub fn now(event: LogEvent) -> Self {
        Self {
            timestamp: Local::now(),
            level: event.level(),
            event,
        }
    }
}

/// Sink for session audit events
pub trait SessionLog {
    fn record(&mut self, event: LogEvent) -> Result<(), SessionLogError>;
}

/// JSONL file named after the session start time
pub struct JsonlSessionLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlSessionLog {
    /// Create `session_{unix_seconds}.jsonl` under `dir`, creating `dir` if needed
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> Result<Self, SessionLogError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("session_{}.jsonl", started_at.timestamp()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionLog for JsonlSessionLog {
    fn record(&mut self, event: LogEvent) -> Result<(), SessionLogError> {
        serde_json::to_writer(&mut self.writer, &LogRecord::now(event))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySessionLog {
    pub records: Vec<LogRecord>,
}

#[cfg(test)]
impl MemorySessionLog {
    pub fn events(&self) -> Vec<&LogEvent> {
        self.records.iter().map(|r| &r.event).collect()
    }
}

#[cfg(test)]
impl SessionLog for MemorySessionLog {
    fn record(&mut self, event: LogEvent) -> Result<(), SessionLogError> {
        self.records.push(LogRecord::now(event));
        Ok(())
    }
}
