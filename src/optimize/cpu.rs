// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! CPU boost and scaling governor tuning.

use crate::{config::Settings, process::privileged_write};

use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Tune CPU frequency behaviour through sysfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuOptimizer {
    sysfs_dir: PathBuf,
    enable_boost: bool,
    governor: String,
    use_sudo: bool,
}

impl CpuOptimizer {
    pub fn new(
        sysfs_dir: impl Into<PathBuf>,
        enable_boost: bool,
        governor: impl Into<String>,
        use_sudo: bool,
    ) -> Self {
        Self {
            sysfs_dir: sysfs_dir.into(),
            enable_boost,
            governor: governor.into(),
            use_sudo,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.cpu_sysfs_dir(),
            settings.enable_cpu_boost(),
            settings.cpu_governor(),
            settings.use_sudo(),
        )
    }

    /// Enable boost if asked to, then set the scaling governor of every core.
    ///
    /// Hardware without a boost control file is not an error. Boost is
    /// skipped with a warning, and governor tuning goes ahead regardless.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> CpuReport {
        let boost = self.apply_boost();

        let governor_files = self.governor_files();
        let mut governors_set = 0;
        for path in &governor_files {
            match privileged_write(self.use_sudo, path, &self.governor) {
                Ok(()) => governors_set += 1,
                Err(error) => warn!("cannot set governor at {}: {error}", path.display()),
            }
        }

        if governor_files.is_empty() {
            warn!("no scaling governor found under {}", self.sysfs_dir.display());
        } else {
            info!(
                "{} governor set for {governors_set}/{} cores",
                self.governor,
                governor_files.len()
            );
        }

        CpuReport {
            boost,
            governors_set,
            governors_total: governor_files.len(),
        }
    }

    fn apply_boost(&self) -> BoostOutcome {
        if !self.enable_boost {
            info!("CPU boost left untouched");
            return BoostOutcome::Disabled;
        }

        let boost = self.boost_file();
        if !boost.exists() {
            warn!("CPU boost not supported, {} is missing", boost.display());
            return BoostOutcome::Unsupported;
        }

        match privileged_write(self.use_sudo, &boost, "1") {
            Ok(()) => {
                info!("CPU boost enabled");
                BoostOutcome::Enabled
            }
            Err(error) => {
                warn!("cannot enable CPU boost: {error}");
                BoostOutcome::Failed(error.to_string())
            }
        }
    }

    pub(crate) fn boost_file(&self) -> PathBuf {
        self.sysfs_dir.join("cpufreq").join("boost")
    }

    fn governor_files(&self) -> Vec<PathBuf> {
        governor_files(&self.sysfs_dir)
    }
}

/// Find every per-core scaling governor file, sorted.
pub(crate) fn governor_files(sysfs_dir: &Path) -> Vec<PathBuf> {
    let pattern = sysfs_dir.join("cpu*").join("cpufreq").join("scaling_governor");
    let mut files = match glob(pattern.to_string_lossy().as_ref()) {
        Ok(paths) => paths.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(error) => {
            warn!("bad governor pattern {}: {error}", pattern.display());
            Vec::new()
        }
    };
    files.sort();
    files
}

/// What happened to CPU boost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoostOutcome {
    Enabled,
    Disabled,
    Unsupported,
    Failed(String),
}

/// Result of a CPU optimizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuReport {
    pub boost: BoostOutcome,
    pub governors_set: usize,
    pub governors_total: usize,
}

impl CpuReport {
    /// Exit code of the run.
    ///
    /// Only a run that found governor files, yet failed to set any of them,
    /// counts as failure.
    pub fn exit_code(&self) -> i32 {
        if self.governors_total > 0 && self.governors_set == 0 {
            1
        } else {
            0
        }
    }
}
