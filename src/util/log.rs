//! Reply log sinks
//!
//! The controller hands each human-readable line (a discovered address, a
//! decoded reply as CSV) to a [`ReplyLog`]. Where the line ends up is the
//! sink's business.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::info;

use crate::core::Result;

/// File the CSV sink appends to inside its directory
pub const POINTS_FILE: &str = "points.csv";

/// Destination for reply lines
pub trait ReplyLog {
    /// Records one line
    fn emit(&mut self, line: &str) -> Result<()>;
}

/// Emits every line as a tracing event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ReplyLog for TracingLog {
    fn emit(&mut self, line: &str) -> Result<()> {
        info!(target: "mxspeak::points", "{}", line);
        Ok(())
    }
}

/// Appends `timestamp,line` rows to a CSV file
pub struct CsvFileLog {
    path: PathBuf,
    writer: BufWriter<File>,
    created_directory: bool,
}

impl CsvFileLog {
    /// Opens `points.csv` in `directory`, creating the directory if missing
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let created_directory = !directory.is_dir();
        if created_directory {
            fs::create_dir_all(directory)?;
            info!(directory = %directory.display(), "created log directory");
        }

        let path = directory.join(POINTS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(CsvFileLog {
            path,
            writer: BufWriter::new(file),
            created_directory,
        })
    }

    /// Path of the CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether opening the log had to create its directory
    pub fn created_directory(&self) -> bool {
        self.created_directory
    }
}

impl ReplyLog for CsvFileLog {
    fn emit(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{},{}", Utc::now().to_rfc3339(), line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps lines in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    /// Empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReplyLog for MemoryLog {
    fn emit(&mut self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}
