// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! System facts snapshot.
//!
//! Every backup record carries a `system_info.txt` describing the machine it
//! was taken on. The facts are for humans only. Nothing reads them back.

use crate::{
    monitor::{format_duration, gib},
    process::{syscall_non_interactive, tool_available},
};

use std::fmt::{Display, Formatter, Result as FmtResult};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// File name of the system facts inside a backup directory.
pub const FACTS_FILE: &str = "system_info.txt";

const UNKNOWN: &str = "unknown";

/// Descriptive facts about the running system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFacts {
    pub hostname: String,
    pub kernel: String,
    pub cpu_model: String,
    pub total_memory: String,
    pub boot_time: String,
    pub uptime: String,
}

impl Default for SystemFacts {
    fn default() -> Self {
        Self {
            hostname: UNKNOWN.into(),
            kernel: UNKNOWN.into(),
            cpu_model: UNKNOWN.into(),
            total_memory: UNKNOWN.into(),
            boot_time: UNKNOWN.into(),
            uptime: UNKNOWN.into(),
        }
    }
}

impl SystemFacts {
    /// Gather facts through sysinfo, and boot duration through systemd.
    ///
    /// Never fails. Whatever cannot be determined is reported as unknown.
    pub fn gather() -> Self {
        let defaults = Self::default();
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        let cpu_model = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or(defaults.cpu_model);
        let total_memory = match system.total_memory() {
            0 => defaults.total_memory,
            bytes => format!("{:.1} GiB", gib(bytes)),
        };

        Self {
            hostname: System::host_name().unwrap_or(defaults.hostname),
            kernel: System::kernel_version().unwrap_or(defaults.kernel),
            cpu_model,
            total_memory,
            boot_time: boot_time().unwrap_or(defaults.boot_time),
            uptime: format_duration(System::uptime()),
        }
    }
}

impl Display for SystemFacts {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "Hostname: {}", self.hostname)?;
        writeln!(fmt, "Kernel: {}", self.kernel)?;
        writeln!(fmt, "CPU: {}", self.cpu_model)?;
        writeln!(fmt, "Memory: {}", self.total_memory)?;
        writeln!(fmt, "Boot time: {}", self.boot_time)?;
        writeln!(fmt, "Uptime: {}", self.uptime)
    }
}

fn boot_time() -> Option<String> {
    if !tool_available("systemd-analyze") {
        return None;
    }

    syscall_non_interactive("systemd-analyze", ["time"])
        .ok()
        .and_then(|output| output.lines().next().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_facts() {
        let facts = SystemFacts {
            hostname: "pop-os".into(),
            kernel: "6.9.3-76060903-generic".into(),
            ..Default::default()
        };

        let expect = indoc! {"
            Hostname: pop-os
            Kernel: 6.9.3-76060903-generic
            CPU: unknown
            Memory: unknown
            Boot time: unknown
            Uptime: unknown
        "};

        assert_eq!(facts.to_string(), expect);
    }

    #[test]
    fn gathered_facts_render_every_field() {
        let rendered = SystemFacts::gather().to_string();

        for label in ["Hostname:", "Kernel:", "CPU:", "Memory:", "Boot time:", "Uptime:"] {
            assert!(rendered.contains(label), "missing {label}");
        }
        assert_eq!(rendered.lines().count(), 6);
    }
}
