// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! The configuration set is a flat TOML file of top-level `KEY = value`
//! assignments. Every key is optional. Unknown keys are ignored, and a known
//! key holding a value of the wrong type is reported and replaced by its
//! default, so a half-broken configuration file never stops the tool. Only a
//! file that is not valid TOML at all is rejected.
//!
//! # Example
//!
//! ```toml
//! BACKUP_ROOT = "~/popopt-backups"
//! ENABLE_CPU_BOOST = true
//! CPU_GOVERNOR = "performance"
//! SYSCTL_SETTINGS = ["vm.swappiness=10", "vm.dirty_ratio=20"]
//! ```

use crate::path::{default_backup_root, default_log_file};

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};

/// Configuration files captured by a backup unless told otherwise.
pub const DEFAULT_BACKUP_FILES: [&str; 4] = [
    "/etc/default/grub",
    "/etc/fstab",
    "/etc/sysctl.conf",
    "/etc/systemd/system/set-cpu-governor.service",
];

/// Kernel parameters applied by the memory optimizer unless told otherwise.
pub const DEFAULT_SYSCTL_SETTINGS: [&str; 5] = [
    "vm.swappiness=10",
    "vm.vfs_cache_pressure=50",
    "vm.dirty_ratio=20",
    "vm.dirty_background_ratio=10",
    "vm.page-cluster=0",
];

/// Raw configuration set as read from disk.
///
/// Every field is optional. Use the accessor methods to obtain the value
/// with its default applied.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<PathBuf>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<PathBuf>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub backup_files: Option<Vec<PathBuf>>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_cpu_boost: Option<bool>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cpu_governor: Option<String>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cpu_sysfs_dir: Option<PathBuf>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub use_sudo: Option<bool>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sysctl_settings: Option<Vec<String>>,

    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub swappiness_target: Option<u32>,
}

impl Settings {
    /// Load configuration set from file.
    ///
    /// A missing file is not an error: every option simply takes its default.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be read.
    /// - Return [`ConfigError::Deserialize`] if the file is not valid TOML.
    /// - Return [`ConfigError::ShellExpansion`] if a path cannot be expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match read_to_string(path) {
            Ok(data) => {
                debug!("load configuration from {}", path.display());
                data.parse()
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("no configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(error) => Err(ConfigError::Read {
                source: error,
                path: path.into(),
            }),
        }
    }

    /// Directory that holds every backup record.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if no default can be determined.
    pub fn backup_root(&self) -> Result<PathBuf> {
        match &self.backup_root {
            Some(path) => Ok(path.clone()),
            None => Ok(default_backup_root()?),
        }
    }

    /// Append-only activity log.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if no default can be determined.
    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(default_log_file()?),
        }
    }

    /// Directory holding external optimizer scripts.
    pub fn scripts_dir(&self) -> PathBuf {
        self.scripts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("scripts"))
    }

    /// Configuration files to capture on backup.
    pub fn backup_files(&self) -> Vec<PathBuf> {
        match &self.backup_files {
            Some(files) => files.clone(),
            None => DEFAULT_BACKUP_FILES.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn enable_cpu_boost(&self) -> bool {
        self.enable_cpu_boost.unwrap_or(true)
    }

    pub fn cpu_governor(&self) -> &str {
        self.cpu_governor.as_deref().unwrap_or("performance")
    }

    pub fn cpu_sysfs_dir(&self) -> PathBuf {
        self.cpu_sysfs_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("/sys/devices/system/cpu"))
    }

    /// Route privileged writes and commands through `sudo`.
    pub fn use_sudo(&self) -> bool {
        self.use_sudo.unwrap_or(true)
    }

    pub fn sysctl_settings(&self) -> Vec<String> {
        match &self.sysctl_settings {
            Some(settings) => settings.clone(),
            None => DEFAULT_SYSCTL_SETTINGS.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn swappiness_target(&self) -> u32 {
        self.swappiness_target.unwrap_or(10)
    }

    fn expand_paths(&mut self) -> Result<()> {
        for path in [
            &mut self.backup_root,
            &mut self.log_file,
            &mut self.scripts_dir,
            &mut self.cpu_sysfs_dir,
        ]
        .into_iter()
        .flatten()
        {
            *path = expand(path)?;
        }

        if let Some(files) = &mut self.backup_files {
            for path in files.iter_mut() {
                *path = expand(path)?;
            }
        }

        Ok(())
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        settings.expand_paths()?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

// Wrong value types fall back to the default instead of rejecting the file.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = toml::Value::deserialize(deserializer)?;
    match value.clone().try_into::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(error) => {
            warn!("ignoring malformed configuration value {value}: {error}");
            Ok(None)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// No default location could be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
