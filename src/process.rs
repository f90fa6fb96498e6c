// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process plumbing.
//!
//! Every action in popopt eventually boils down to running some system tool,
//! or writing some kernel tunable. This module keeps that plumbing in one
//! place. Missing tools are detected up front through [`tool_available`] so
//! callers can warn and skip instead of failing halfway.

use std::{
    ffi::{OsStr, OsString},
    fs::write,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};
use tracing::debug;

/// Exit code reported for actions that could not even be started.
pub const EXIT_NOT_STARTED: i32 = 127;

/// Check whether a tool can be found on `PATH`, or exists if given a path.
pub fn tool_available(tool: impl AsRef<OsStr>) -> bool {
    which::which(tool.as_ref()).is_ok()
}

/// Reduce exit status to a plain exit code.
///
/// Processes killed by a signal have no exit code of their own, so they are
/// reported as a generic failure.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Run command attached to the current terminal.
///
/// Blocks until the command finishes, then hands back its exit status. A
/// non-zero status is not an error here; callers decide what it means.
///
/// # Errors
///
/// - Return [`ProcessError::Spawn`] if the command cannot be started.
pub fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<ExitStatus> {
    debug!("run {:?} interactively", cmd.as_ref());
    Command::new(cmd.as_ref())
        .args(args)
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|err| ProcessError::Spawn {
            source: err,
            command: cmd.as_ref().into(),
        })
}

/// Run command and capture its output.
///
/// Output to stdout and stderr is returned together as one string with its
/// trailing newline chomped.
///
/// # Errors
///
/// - Return [`ProcessError::Spawn`] if the command cannot be started.
/// - Return [`ProcessError::Failed`] if the command exits unsuccessfully.
pub fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    debug!("run {:?}", cmd.as_ref());
    let output = Command::new(cmd.as_ref())
        .args(args)
        .output()
        .map_err(|err| ProcessError::Spawn {
            source: err,
            command: cmd.as_ref().into(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();
    message.push_str(stdout.as_str());
    message.push_str(stderr.as_str());

    // INVARIANT: Chomp trailing newlines.
    let message = message.trim_end_matches(['\r', '\n']).to_string();

    if !output.status.success() {
        return Err(ProcessError::Failed {
            command: cmd.as_ref().into(),
            code: exit_code(output.status),
            message,
        });
    }

    Ok(message)
}

/// Run command with elevated privileges when requested.
///
/// # Errors
///
/// - Return [`ProcessError::Spawn`] if the command cannot be started.
/// - Return [`ProcessError::Failed`] if the command exits unsuccessfully.
pub fn privileged_call(
    use_sudo: bool,
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    if use_sudo {
        let mut sudo_args: Vec<OsString> = vec![cmd.as_ref().into()];
        sudo_args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        syscall_non_interactive("sudo", sudo_args)
    } else {
        syscall_non_interactive(cmd, args)
    }
}

/// Write value into a file that may need elevated privileges, e.g., sysfs.
///
/// With `use_sudo` the value is piped through `sudo tee`, otherwise the file
/// is written directly.
///
/// # Errors
///
/// - Return [`ProcessError::Write`] if direct write fails.
/// - Return [`ProcessError::Spawn`] or [`ProcessError::Failed`] if the
///   `sudo tee` call fails.
pub fn privileged_write(use_sudo: bool, path: &Path, value: &str) -> Result<()> {
    if !use_sudo {
        return write(path, value).map_err(|err| ProcessError::Write {
            source: err,
            path: path.into(),
        });
    }

    let spawn_error = |err| ProcessError::Spawn {
        source: err,
        command: "sudo".into(),
    };
    let mut child = Command::new("sudo")
        .arg("tee")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .map_err(spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(value.as_bytes()).map_err(spawn_error)?;
    }

    let status = child.wait().map_err(spawn_error)?;
    if !status.success() {
        return Err(ProcessError::Failed {
            command: "sudo tee".into(),
            code: exit_code(status),
            message: format!("cannot write to {}", path.display()),
        });
    }

    Ok(())
}

/// Copy file over a destination that may need elevated privileges.
///
/// # Errors
///
/// - Return [`ProcessError::Write`] if direct copy fails.
/// - Return [`ProcessError::Spawn`] or [`ProcessError::Failed`] if the
///   `sudo cp` call fails.
pub fn privileged_copy(use_sudo: bool, from: &Path, to: &Path) -> Result<()> {
    if use_sudo {
        privileged_call(true, "cp", [from.as_os_str(), to.as_os_str()])?;
        return Ok(());
    }

    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|err| ProcessError::Write {
            source: err,
            path: to.into(),
        })
}

/// External process error types.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Command could not be started at all.
    #[error("failed to start command {command:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        command: OsString,
    },

    /// Command ran, but exited unsuccessfully.
    #[error("command {command:?} failed with exit code {code}: {message}")]
    Failed {
        command: OsString,
        code: i32,
        message: String,
    },

    /// File could not be written directly.
    #[error("failed to write to {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl ProcessError {
    /// Exit code that best describes this failure.
    pub fn code(&self) -> i32 {
        match self {
            Self::Spawn { .. } => EXIT_NOT_STARTED,
            Self::Failed { code, .. } => *code,
            Self::Write { .. } => 1,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = ProcessError> = std::result::Result<T, E>;
