// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Kernel memory tunables.

use crate::{
    config::Settings,
    process::{privileged_call, tool_available},
};

use tracing::{info, instrument, warn};

/// Apply `sysctl` settings one by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryOptimizer {
    settings: Vec<String>,
    use_sudo: bool,
}

impl MemoryOptimizer {
    pub fn new(settings: Vec<String>, use_sudo: bool) -> Self {
        Self { settings, use_sudo }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.sysctl_settings(), settings.use_sudo())
    }

    /// Apply every well-formed setting.
    ///
    /// Malformed settings, failed settings, and a missing `sysctl` binary are
    /// all warnings. The run as a whole always succeeds.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> MemoryReport {
        let mut report = MemoryReport::default();

        let (valid, malformed): (Vec<_>, Vec<_>) = self
            .settings
            .iter()
            .partition(|setting| parse_setting(setting).is_some());
        for setting in malformed {
            warn!("ignoring malformed sysctl setting {setting:?}");
            report.skipped.push((setting.clone(), "malformed".into()));
        }

        if !tool_available("sysctl") {
            warn!("sysctl not found, skipping memory tuning");
            for setting in valid {
                report.skipped.push((setting.clone(), "sysctl not found".into()));
            }
            return report;
        }

        for setting in valid {
            match privileged_call(self.use_sudo, "sysctl", ["-w", setting.as_str()]) {
                Ok(_) => {
                    info!("applied {setting}");
                    report.applied.push(setting.clone());
                }
                Err(error) => {
                    warn!("failed to apply {setting}: {error}");
                    report.skipped.push((setting.clone(), error.to_string()));
                }
            }
        }

        report
    }
}

/// Result of a memory optimizer run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryReport {
    pub applied: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

/// Split `key=value` setting. Keys may not contain whitespace.
pub(crate) fn parse_setting(setting: &str) -> Option<(&str, &str)> {
    let (key, value) = setting.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }

    Some((key, value))
}
