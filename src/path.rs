// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations for the configuration file, the backup root,
//! and the activity log. None of these functions check that the returned path
//! actually exists.

use std::path::PathBuf;

/// Determine default absolute path to the configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/popopt/config.toml`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("popopt").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the backup root.
///
/// Uses `$XDG_DATA_HOME/popopt/backups`. Every backup record becomes its own
/// directory directly under this path.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_backup_root() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("popopt").join("backups"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the activity log.
///
/// Uses `$XDG_DATA_HOME/popopt/popopt.log`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_log_file() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("popopt").join("popopt.log"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
