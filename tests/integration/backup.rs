// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{copy_count, live_files};

use anyhow::Result;
use popopt::backup::{
    facts::FACTS_FILE, manifest::MANIFEST_FILE, script::SCRIPT_FILE, BackupManager, CaptureOutcome,
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{fs::read_to_string, path::PathBuf};

#[sealed_test]
fn backup_without_any_source_is_still_valid() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let sources = vec![cwd.join("live/grub"), cwd.join("live/fstab")];
    let manager = BackupManager::new(cwd.join("backups"), sources, false);

    let report = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;

    assert!(report.dir.is_dir());
    assert!(report.dir.join(FACTS_FILE).is_file());
    assert!(report.dir.join(SCRIPT_FILE).is_file());
    assert!(report.dir.join(MANIFEST_FILE).is_file());
    assert_eq!(copy_count(&report.dir)?, 0);
    assert_eq!(report.captured().count(), 0);
    assert_eq!(report.skipped().count(), 2);

    Ok(())
}

#[sealed_test]
fn distinct_backups_share_nothing() -> Result<()> {
    let sources = live_files(&[("etc/fstab", "first\n")])?;
    let cwd = std::env::current_dir()?;
    let manager = BackupManager::new(cwd.join("backups"), sources.clone(), false);

    let first = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;
    std::fs::write(&sources[0], "second\n")?;
    let second = manager.create_with_id("20250101_120001", "2025-01-01 12:00:01")?;

    assert_ne!(first.dir, second.dir);
    let copy = match &first.outcomes[0] {
        CaptureOutcome::Captured { copy, .. } => copy.clone(),
        other => panic!("expected capture, got {other:?}"),
    };
    assert_eq!(read_to_string(first.dir.join(&copy))?, "first\n");
    assert_eq!(read_to_string(second.dir.join(&copy))?, "second\n");
    assert_eq!(
        manager.list()?,
        vec![first.dir.clone(), second.dir.clone()]
    );

    Ok(())
}

#[sealed_test]
fn restore_script_offers_only_captured_files() -> Result<()> {
    let mut sources = live_files(&[("etc/fstab", "fstab\n"), ("etc/sysctl.conf", "vm.x=1\n")])?;
    let missing = std::env::current_dir()?.join("live/etc/default/grub");
    sources.push(missing.clone());

    let manager = BackupManager::new("backups", sources.clone(), false);
    let report = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;
    let script = read_to_string(report.dir.join(SCRIPT_FILE))?;

    for outcome in &report.outcomes {
        match outcome {
            CaptureOutcome::Captured { source, copy } => {
                assert!(script.contains(&format!("Restore {}?", source.display())));
                assert!(report.dir.join(copy).is_file());
            }
            CaptureOutcome::Skipped { source, .. } => {
                assert!(!script.contains(source.to_string_lossy().as_ref()));
            }
        }
    }
    assert!(!script.contains("update-grub"));
    assert_eq!(copy_count(&report.dir)?, 2);
    assert!(!PathBuf::from(&missing).exists());

    Ok(())
}
