// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Current optimization status.
//!
//! Inspect the running system to see which tweaks appear to be in effect.
//! Every probe is read-only, and a probe that cannot run reports unknown.

use crate::{
    config::Settings,
    optimize::cpu::CpuOptimizer,
    process::{syscall_non_interactive, tool_available},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::Path,
};

/// Snapshot of which optimizations are in effect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptimizationStatus {
    /// Boost flag, if the hardware exposes one.
    pub cpu_boost: Option<bool>,

    /// Scaling governor of the first core.
    pub cpu_governor: Option<String>,

    /// Swappiness matches the configured target.
    pub memory_optimized: bool,

    /// Periodic TRIM timer is enabled.
    pub ssd_optimized: bool,

    /// Desktop animations are switched off.
    pub desktop_optimized: bool,
}

impl OptimizationStatus {
    /// Probe the running system.
    pub fn probe(settings: &Settings) -> Self {
        let sysfs_dir = settings.cpu_sysfs_dir();
        let boost_file = CpuOptimizer::from_settings(settings).boost_file();

        Self {
            cpu_boost: read_trimmed(&boost_file).map(|value| value == "1"),
            cpu_governor: read_trimmed(&sysfs_dir.join("cpu0/cpufreq/scaling_governor")),
            memory_optimized: read_trimmed(Path::new("/proc/sys/vm/swappiness"))
                .and_then(|value| value.parse::<u32>().ok())
                .is_some_and(|value| value == settings.swappiness_target()),
            ssd_optimized: tool_available("systemctl")
                && syscall_non_interactive("systemctl", ["is-enabled", "fstrim.timer"]).is_ok(),
            desktop_optimized: tool_available("gsettings")
                && syscall_non_interactive(
                    "gsettings",
                    ["get", "org.gnome.desktop.interface", "enable-animations"],
                )
                .is_ok_and(|output| output.trim() == "false"),
        }
    }
}

impl Display for OptimizationStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let flag = |on: bool| if on { "yes" } else { "no" };

        let boost = match self.cpu_boost {
            Some(on) => flag(on),
            None => "unsupported",
        };
        writeln!(fmt, "CPU boost: {boost}")?;
        writeln!(
            fmt,
            "CPU governor: {}",
            self.cpu_governor.as_deref().unwrap_or("unknown")
        )?;
        writeln!(fmt, "Memory optimized: {}", flag(self.memory_optimized))?;
        writeln!(fmt, "SSD optimized: {}", flag(self.ssd_optimized))?;
        writeln!(fmt, "Desktop optimized: {}", flag(self.desktop_optimized))
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    read_to_string(path).ok().map(|value| value.trim().to_string())
}
