//! Persistent, append-only error log.
//!
//! Sweeps run unattended for days under a scheduler, so fatal conditions
//! (hard stops, pool-recreation failures) are recorded in a file that
//! survives the process. Each entry carries a UTC timestamp and the full
//! invoking command line, so an operator reading the log can tell *which*
//! submission stalled and re-invoke it.
//!
//! The log is written only from the supervisor's control thread, never from
//! workers, so appends need no cross-thread coordination.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
    command: String,
}

impl ErrorLog {
    /// Create a handle writing to `path`, tagging entries with the current
    /// process's argv.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            command: std::env::args().collect::<Vec<_>>().join(" "),
        }
    }

    #[cfg(test)]
    pub fn with_command(path: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            command: command.into(),
        }
    }

    /// Append one timestamped entry. The file is created on first use.
    pub fn append(&self, cause: &str) -> Result<(), AppError> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::io(format!("Failed to open error log '{}'", self.path.display()), e)
            })?;
        writeln!(
            file,
            "{} | {cause} | cmd: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            self.command
        )
        .map_err(|e| AppError::io(format!("Failed to append to error log '{}'", self.path.display()), e))
    }

    /// Append, degrading to stderr if the log itself is unwritable. A
    /// failing log must never take down a run that is otherwise making
    /// progress.
    pub fn append_best_effort(&self, cause: &str) {
        if let Err(e) = self.append(cause) {
            eprintln!("{e} (while logging: {cause})");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
