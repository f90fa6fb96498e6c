// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Run context.
//!
//! The configuration set and the activity log are loaded once at startup, and
//! handed to every component through [`Context`]. Neither changes for the
//! rest of the run.

use crate::{
    backup::BackupManager,
    config::{ConfigError, Settings},
    journal::{Journal, JournalError},
};

use std::path::Path;

/// Configuration and activity log of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub settings: Settings,
    pub journal: Journal,
}

impl Context {
    pub fn new(settings: Settings, journal: Journal) -> Self {
        Self { settings, journal }
    }

    /// Load configuration file and open the activity log it names.
    ///
    /// # Errors
    ///
    /// - Return [`ContextError::Config`] if configuration cannot be loaded.
    /// - Return [`ContextError::Journal`] if activity log cannot be opened.
    pub fn load(config_file: impl AsRef<Path>) -> Result<Self> {
        let settings = Settings::load(config_file)?;
        let journal = Journal::open(settings.log_file()?)?;

        Ok(Self::new(settings, journal))
    }

    /// Backup manager over the configured backup root and file list.
    ///
    /// # Errors
    ///
    /// - Return [`ContextError::Config`] if backup root cannot be determined.
    pub fn backup_manager(&self) -> Result<BackupManager> {
        Ok(BackupManager::new(
            self.settings.backup_root()?,
            self.settings.backup_files(),
            self.settings.use_sudo(),
        ))
    }
}

/// Run context error types.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

/// Friendly result alias :3
pub type Result<T, E = ContextError> = std::result::Result<T, E>;
