// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive restore of a backup record.
//!
//! Restore is the native counterpart of the generated `restore.sh`. It reads
//! the manifest of a record, and offers every captured file back one at a
//! time. Nothing is restored without an explicit yes from the operator, and
//! nothing that was restored can be undone within the same run.

use crate::{
    backup::manifest::{BackupManifest, FollowUp, MANIFEST_FILE},
    process::{privileged_call, privileged_copy, tool_available, ProcessError},
    prompt::{Operator, PromptError},
};

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Perform follow-up steps of restored files.
pub trait FollowUpRunner {
    /// Run given follow-up to completion.
    fn run(&mut self, follow_up: FollowUp) -> Result<(), ProcessError>;
}

/// Run follow-ups as real system commands.
#[derive(Debug, Clone, Copy)]
pub struct SystemFollowUp {
    use_sudo: bool,
}

impl SystemFollowUp {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }
}

impl FollowUpRunner for SystemFollowUp {
    fn run(&mut self, follow_up: FollowUp) -> Result<(), ProcessError> {
        if !tool_available(follow_up.command()) {
            return Err(ProcessError::Spawn {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not on PATH"),
                command: follow_up.command().into(),
            });
        }

        let output = privileged_call(self.use_sudo, follow_up.command(), [] as [&str; 0])?;
        if !output.is_empty() {
            info!("{output}");
        }

        Ok(())
    }
}

/// What happened to one manifest entry during restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Copy was written back over the live file.
    Restored { source: PathBuf, follow_up_ran: bool },

    /// Operator said no.
    Declined { source: PathBuf },

    /// Copy has vanished from the record since it was made. Never offered.
    MissingCopy { source: PathBuf },

    /// Copy could not be written back.
    Failed { source: PathBuf, reason: String },
}

/// Result of a restore run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
    /// Number of files written back.
    pub fn restored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, RestoreOutcome::Restored { .. }))
            .count()
    }
}

/// Restore a backup record interactively.
///
/// Entries are processed in manifest order. For each entry whose copy still
/// exists the operator is asked for confirmation. Follow-ups are offered
/// behind a second confirmation, and only after their file was restored.
///
/// # Errors
///
/// - Return [`RestoreError::ReadManifest`] if the manifest cannot be read.
/// - Return [`RestoreError::Manifest`] if the manifest cannot be parsed.
/// - Return [`RestoreError::Prompt`] if operator input fails.
#[instrument(skip(operator, follow_ups), level = "debug")]
pub fn restore_record(
    dir: &Path,
    use_sudo: bool,
    operator: &mut impl Operator,
    follow_ups: &mut impl FollowUpRunner,
) -> Result<RestoreReport> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest: BackupManifest = read_to_string(&manifest_path)
        .map_err(|err| RestoreError::ReadManifest {
            source: err,
            path: manifest_path.clone(),
        })?
        .parse()?;

    info!("restore backup {} ({})", manifest.id, manifest.created);
    let mut outcomes = Vec::with_capacity(manifest.entries.len());
    for entry in manifest.entries {
        let source = entry.source;
        let copy = dir.join(&entry.copy);
        if !copy.is_file() {
            warn!("copy of {} is missing from backup", source.display());
            outcomes.push(RestoreOutcome::MissingCopy { source });
            continue;
        }

        if !operator.confirm(&format!("Restore {}?", source.display()))? {
            info!("kept current {}", source.display());
            outcomes.push(RestoreOutcome::Declined { source });
            continue;
        }

        if let Err(error) = privileged_copy(use_sudo, &copy, &source) {
            warn!("failed to restore {}: {error}", source.display());
            outcomes.push(RestoreOutcome::Failed {
                source,
                reason: error.to_string(),
            });
            continue;
        }
        info!("restored {}", source.display());

        let follow_up_ran = match entry.follow_up {
            Some(follow_up) => run_follow_up(follow_up, operator, follow_ups)?,
            None => false,
        };

        outcomes.push(RestoreOutcome::Restored {
            source,
            follow_up_ran,
        });
    }

    Ok(RestoreReport { outcomes })
}

fn run_follow_up(
    follow_up: FollowUp,
    operator: &mut impl Operator,
    follow_ups: &mut impl FollowUpRunner,
) -> Result<bool> {
    if !operator.confirm(follow_up.question())? {
        return Ok(false);
    }

    match follow_ups.run(follow_up) {
        Ok(()) => Ok(true),
        Err(error) => {
            warn!("{} failed: {error}", follow_up.command());
            Ok(false)
        }
    }
}

/// Restore error types.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("failed to read backup manifest at {:?}", path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Manifest(#[from] crate::backup::manifest::ManifestError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Friendly result alias :3
pub type Result<T, E = RestoreError> = std::result::Result<T, E>;
