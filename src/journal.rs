// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Append-only activity log.
//!
//! Every action the dispatcher runs leaves one line in the activity log. Each
//! line is prefixed by a local `[YYYY-MM-DD HH:MM:SS]` timestamp. The log is
//! never rotated or truncated.

use chrono::Local;
use std::{
    fs::{read_to_string, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Timestamp layout used as line prefix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handle to the activity log file.
///
/// The file is opened in append mode for every record, so no descriptor is
/// held between writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Construct new journal handle.
    ///
    /// Creates parent directories of the log file when missing.
    ///
    /// # Errors
    ///
    /// - Return [`JournalError::CreateDir`] if parent directory cannot be
    ///   created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(|err| JournalError::CreateDir {
                source: err,
                path: parent.into(),
            })?;
        }

        Ok(Self { path })
    }

    /// Append one timestamped line.
    ///
    /// # Errors
    ///
    /// - Return [`JournalError::Append`] if the log cannot be written to.
    pub fn record(&self, message: impl AsRef<str>) -> Result<()> {
        let line = format!(
            "[{}] {}\n",
            Local::now().format(TIMESTAMP_FORMAT),
            message.as_ref()
        );

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .map_err(|err| JournalError::Append {
                source: err,
                path: self.path.clone(),
            })
    }

    /// Read back every recorded line.
    ///
    /// A log that was never written to yields no lines.
    ///
    /// # Errors
    ///
    /// - Return [`JournalError::Read`] if the log exists but cannot be read.
    pub fn lines(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        read_to_string(&self.path)
            .map(|content| content.lines().map(str::to_owned).collect())
            .map_err(|err| JournalError::Read {
                source: err,
                path: self.path.clone(),
            })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

/// Activity log error types.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("failed to create log directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("failed to append to log at {:?}", path.display())]
    Append {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("failed to read log at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = JournalError> = std::result::Result<T, E>;
