// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backup manifest layout.
//!
//! Each backup record carries a `manifest.toml` that lists the files that were
//! actually captured, and where each one came from. Skipped files never make
//! it into the manifest, so anything restore reads from here has a copy
//! sitting next to it.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// File name of the manifest inside a backup directory.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Listing of captured files for one backup record.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct BackupManifest {
    /// Timestamp identifier of the record.
    pub id: String,

    /// Human readable creation time.
    pub created: String,

    /// Captured files.
    #[serde(default, rename = "entry")]
    pub entries: Vec<ManifestEntry>,
}

impl BackupManifest {
    pub fn new(id: impl Into<String>, created: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: created.into(),
            entries: Vec::new(),
        }
    }
}

impl FromStr for BackupManifest {
    type Err = ManifestError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ManifestError::Deserialize)
    }
}

impl Display for BackupManifest {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ManifestError::Serialize)?
                .as_str(),
        )
    }
}

/// One captured file.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ManifestEntry {
    /// Absolute path of the live file.
    pub source: PathBuf,

    /// File name of the copy inside the backup directory.
    pub copy: String,

    /// Extra step needed before a restored file takes effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUp>,
}

impl ManifestEntry {
    /// Construct entry, detecting any follow-up the source path needs.
    pub fn new(source: impl Into<PathBuf>, copy: impl Into<String>) -> Self {
        let source = source.into();
        let follow_up = FollowUp::for_source(&source);
        Self {
            source,
            copy: copy.into(),
            follow_up,
        }
    }
}

/// Extra step offered after a file is restored.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FollowUp {
    /// Rebuild bootloader menus after `/etc/default/grub` changes.
    RegenerateBootloader,
}

impl FollowUp {
    /// Determine follow-up needed for given live path, if any.
    pub fn for_source(path: &Path) -> Option<Self> {
        if path.ends_with("default/grub") {
            Some(Self::RegenerateBootloader)
        } else {
            None
        }
    }

    /// Command that performs the follow-up.
    pub fn command(&self) -> &'static str {
        match self {
            Self::RegenerateBootloader => "update-grub",
        }
    }

    /// Confirmation question shown before running the follow-up.
    pub fn question(&self) -> &'static str {
        match self {
            Self::RegenerateBootloader => "Run update-grub to apply the restored bootloader configuration?",
        }
    }
}

/// Manifest error types.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

impl From<ManifestError> for FmtError {
    fn from(_: ManifestError) -> Self {
        FmtError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn serialize_manifest() {
        let mut manifest = BackupManifest::new("20250101_120000", "2025-01-01 12:00:00");
        manifest
            .entries
            .push(ManifestEntry::new("/etc/default/grub", "etc_default_grub.backup"));
        manifest
            .entries
            .push(ManifestEntry::new("/etc/fstab", "etc_fstab.backup"));

        let expect = indoc! {r#"
            id = "20250101_120000"
            created = "2025-01-01 12:00:00"

            [[entry]]
            source = "/etc/default/grub"
            copy = "etc_default_grub.backup"
            follow_up = "regenerate-bootloader"

            [[entry]]
            source = "/etc/fstab"
            copy = "etc_fstab.backup"
        "#};

        assert_eq!(manifest.to_string(), expect);
    }

    #[test]
    fn deserialize_manifest() -> anyhow::Result<()> {
        let result: BackupManifest = r#"
            id = "20250101_120000"
            created = "2025-01-01 12:00:00"

            [[entry]]
            source = "/etc/sysctl.conf"
            copy = "etc_sysctl.conf.backup"
        "#
        .parse()?;

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].source, PathBuf::from("/etc/sysctl.conf"));
        assert_eq!(result.entries[0].follow_up, None);

        let empty: BackupManifest = r#"
            id = "20250101_120000"
            created = "2025-01-01 12:00:00"
        "#
        .parse()?;
        assert!(empty.entries.is_empty());

        Ok(())
    }

    #[test]
    fn only_bootloader_config_needs_follow_up() {
        assert_eq!(
            FollowUp::for_source(Path::new("/etc/default/grub")),
            Some(FollowUp::RegenerateBootloader)
        );
        assert_eq!(FollowUp::for_source(Path::new("/etc/default/grubby")), None);
        assert_eq!(FollowUp::for_source(Path::new("/etc/fstab")), None);
    }
}
