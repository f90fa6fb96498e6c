// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backup record management.
//!
//! A __backup record__ is a timestamped snapshot of configuration files that
//! popopt is about to tune. Records live side by side in the backup root, and
//! are never modified once created.
//!
//! # Backup Record Layout
//!
//! Each record is a directory named `optimization_backup_<YYYYmmdd_HHMMSS>`
//! that contains:
//!
//! - One `*.backup` copy per captured file. The copy name is the absolute
//!   source path with its leading slash dropped, every other slash replaced by
//!   an underscore, and `.backup` appended. Thus `/etc/default/grub` is
//!   captured as `etc_default_grub.backup`. Distinct sources can flatten to
//!   the same name, e.g., `/x/a_b` and `/x/a/b`. Later ones get a counter
//!   before the extension, like `x_a_b.1.backup`. The manifest always records
//!   the name actually used.
//! - `system_info.txt` describing the machine.
//! - `manifest.toml` listing captured files.
//! - `restore.sh`, an executable script that offers to put every captured file
//!   back where it came from.
//!
//! # Partial Capture
//!
//! The list of files to capture is a superset across machines. Not every
//! machine has a CPU governor service, or even GRUB. So, capture is best
//! effort: a file that cannot be copied is reported and skipped, and the
//! record is still created. Only failure to create the record directory itself
//! fails the whole backup.

pub mod facts;
pub mod manifest;
pub mod restore;
pub mod script;

use crate::backup::{
    facts::{SystemFacts, FACTS_FILE},
    manifest::{BackupManifest, ManifestEntry, MANIFEST_FILE},
    script::{render_restore_script, SCRIPT_FILE},
};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    collections::HashSet,
    fs::{copy, read_dir, set_permissions, write, Permissions},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Prefix of every backup record directory name.
pub const RECORD_PREFIX: &str = "optimization_backup_";

/// Timestamp layout of backup record identifiers.
pub const ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Create and enumerate backup records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupManager {
    root: PathBuf,
    sources: Vec<PathBuf>,
    use_sudo: bool,
}

impl BackupManager {
    /// Construct new backup manager.
    ///
    /// Records are placed under `root`, and capture `sources`. The `use_sudo`
    /// flag is baked into generated restore scripts.
    pub fn new(root: impl Into<PathBuf>, sources: Vec<PathBuf>, use_sudo: bool) -> Self {
        Self {
            root: root.into(),
            sources,
            use_sudo,
        }
    }

    /// Create new backup record identified by the current local time.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::CreateDir`] if record directory cannot be
    ///   created.
    pub fn create(&self) -> Result<BackupReport> {
        let now = Local::now();
        self.create_with_id(
            now.format(ID_FORMAT).to_string(),
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    }

    /// Create new backup record with explicit identifier.
    ///
    /// An existing record with the same identifier is overwritten in place.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::CreateDir`] if record directory cannot be
    ///   created.
    #[instrument(skip_all, level = "debug")]
    pub fn create_with_id(
        &self,
        id: impl Into<String>,
        created: impl Into<String>,
    ) -> Result<BackupReport> {
        let mut manifest = BackupManifest::new(id, created);
        let dir = self.root.join(format!("{RECORD_PREFIX}{}", manifest.id));
        info!("create backup at {}", dir.display());

        // INVARIANT: Record directory must exist, everything after is best effort.
        mkdirp::mkdirp(&dir).map_err(|err| BackupError::CreateDir {
            source: err,
            path: dir.clone(),
        })?;

        let bar = ProgressBar::new(self.sources.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}") {
            bar.set_style(style.progress_chars("-Cco."));
        }

        let mut outcomes = Vec::with_capacity(self.sources.len());
        let mut taken = HashSet::new();
        for source in &self.sources {
            bar.set_message(source.display().to_string());
            let outcome = capture(source, &dir, unique_copy_name(source, &taken));
            bar.suspend(|| match &outcome {
                CaptureOutcome::Captured { source, .. } => info!("backed up {}", source.display()),
                CaptureOutcome::Skipped { source, reason } => {
                    warn!("skipped {}: {reason}", source.display())
                }
            });
            if let CaptureOutcome::Captured { source, copy } = &outcome {
                manifest.entries.push(ManifestEntry::new(source, copy.as_str()));
                taken.insert(copy.clone());
            }
            outcomes.push(outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let facts = SystemFacts::gather();
        if let Err(error) = write(dir.join(FACTS_FILE), facts.to_string()) {
            warn!("cannot write {FACTS_FILE}: {error}");
        }

        if let Err(error) = write(dir.join(MANIFEST_FILE), manifest.to_string()) {
            warn!("cannot write {MANIFEST_FILE}: {error}");
        }

        let script_path = dir.join(SCRIPT_FILE);
        let script = render_restore_script(&manifest, self.use_sudo);
        if let Err(error) = write(&script_path, script)
            .and_then(|_| set_permissions(&script_path, Permissions::from_mode(0o755)))
        {
            warn!("cannot write {SCRIPT_FILE}: {error}");
        }

        info!("backup completed: {}", dir.display());

        Ok(BackupReport { dir, outcomes })
    }

    /// List existing backup records, oldest first.
    ///
    /// A missing backup root simply means there are no records yet.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::ReadRoot`] if backup root cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = read_dir(&self.root).map_err(|err| BackupError::ReadRoot {
            source: err,
            path: self.root.clone(),
        })?;

        // INVARIANT: Identifier layout sorts lexically in creation order.
        let mut records = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with(RECORD_PREFIX))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        records.sort();

        Ok(records)
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }
}

/// Result of a backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    /// Directory of the new record.
    pub dir: PathBuf,

    /// One outcome per configured source, in configuration order.
    pub outcomes: Vec<CaptureOutcome>,
}

impl BackupReport {
    /// Outcomes of files that made it into the record.
    pub fn captured(&self) -> impl Iterator<Item = &CaptureOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CaptureOutcome::Captured { .. }))
    }

    /// Outcomes of files that were left out.
    pub fn skipped(&self) -> impl Iterator<Item = &CaptureOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CaptureOutcome::Skipped { .. }))
    }
}

/// What happened to one configured source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Copied into the record as `copy`.
    Captured { source: PathBuf, copy: String },

    /// Left out of the record.
    Skipped { source: PathBuf, reason: String },
}

/// Determine fixed file name of the copy of a source file.
pub fn copy_name(source: &Path) -> String {
    let path = source.to_string_lossy();
    format!("{}.backup", path.trim_start_matches('/').replace('/', "_"))
}

/// Determine copy name not yet taken by another file of the same record.
pub fn unique_copy_name(source: &Path, taken: &HashSet<String>) -> String {
    let name = copy_name(source);
    if !taken.contains(&name) {
        return name;
    }

    let stem = name.trim_end_matches(".backup");
    (1..)
        .map(|counter| format!("{stem}.{counter}.backup"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(name)
}

fn capture(source: &Path, dir: &Path, name: String) -> CaptureOutcome {
    if !source.is_file() {
        return CaptureOutcome::Skipped {
            source: source.into(),
            reason: "not found".into(),
        };
    }

    match copy(source, dir.join(&name)) {
        Ok(_) => CaptureOutcome::Captured {
            source: source.into(),
            copy: name,
        },
        Err(error) => CaptureOutcome::Skipped {
            source: source.into(),
            reason: error.to_string(),
        },
    }
}

/// Backup error types.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Backup record directory cannot be created.
    #[error("failed to create backup directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Backup root cannot be enumerated.
    #[error("failed to read backup root at {:?}", path.display())]
    ReadRoot {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = BackupError> = std::result::Result<T, E>;
