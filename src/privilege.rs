// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Privilege precondition.
//!
//! Popopt runs as a regular user, and elevates individual commands through
//! `sudo` when it has to. Running the whole tool as root would write backups
//! and logs into root's home, so it is refused before anything else happens.

use nix::unistd::{geteuid, Uid};

/// Refuse to continue as the superuser.
///
/// # Errors
///
/// - Return [`RunningAsRoot`] if effective user is root.
pub fn ensure_unprivileged() -> Result<(), RunningAsRoot> {
    check_uid(geteuid())
}

fn check_uid(uid: Uid) -> Result<(), RunningAsRoot> {
    if uid.is_root() {
        return Err(RunningAsRoot);
    }

    Ok(())
}

/// Tool was started with superuser privileges.
#[derive(Clone, Debug, thiserror::Error)]
#[error("do not run popopt as root, it asks for sudo when needed")]
pub struct RunningAsRoot;
