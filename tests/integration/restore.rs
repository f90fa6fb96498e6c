// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{copy_count, live_files, RecordingFollowUp};

use anyhow::Result;
use popopt::{
    backup::{
        manifest::FollowUp,
        restore::{restore_record, RestoreOutcome},
        script::SCRIPT_FILE,
        BackupManager,
    },
    prompt::ScriptedOperator,
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    fs::{read_to_string, remove_file, write},
    io::Write,
    process::{Command, Stdio},
};

const ORIGINALS: [(&str, &str); 3] = [
    ("etc/fstab", "fstab original\n"),
    ("etc/sysctl.conf", "sysctl original\n"),
    ("etc/hosts", "hosts original\n"),
];

fn backup_then_tamper() -> Result<(std::path::PathBuf, Vec<std::path::PathBuf>)> {
    let sources = live_files(&ORIGINALS)?;
    let manager = BackupManager::new("backups", sources.clone(), false);
    let report = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;

    for source in &sources {
        write(source, "tuned\n")?;
    }

    Ok((report.dir, sources))
}

#[sealed_test]
fn declining_everything_changes_nothing() -> Result<()> {
    let (dir, sources) = backup_then_tamper()?;
    let mut operator = ScriptedOperator::new([] as [&str; 0], [false, false, false]);
    let mut follow_ups = RecordingFollowUp::default();

    let report = restore_record(&dir, false, &mut operator, &mut follow_ups)?;

    assert_eq!(report.restored(), 0);
    assert_eq!(operator.asked().len(), 3);
    for source in &sources {
        assert_eq!(read_to_string(source)?, "tuned\n");
    }

    Ok(())
}

#[sealed_test]
fn confirming_one_of_three_restores_only_that_one() -> Result<()> {
    let (dir, sources) = backup_then_tamper()?;
    let mut operator = ScriptedOperator::new([] as [&str; 0], [false, true, false]);
    let mut follow_ups = RecordingFollowUp::default();

    let report = restore_record(&dir, false, &mut operator, &mut follow_ups)?;

    assert_eq!(
        report.outcomes,
        vec![
            RestoreOutcome::Declined {
                source: sources[0].clone()
            },
            RestoreOutcome::Restored {
                source: sources[1].clone(),
                follow_up_ran: false
            },
            RestoreOutcome::Declined {
                source: sources[2].clone()
            },
        ]
    );
    assert_eq!(read_to_string(&sources[0])?, "tuned\n");
    assert_eq!(read_to_string(&sources[1])?, "sysctl original\n");
    assert_eq!(read_to_string(&sources[2])?, "tuned\n");
    assert!(follow_ups.ran.is_empty());

    Ok(())
}

#[sealed_test]
fn vanished_copy_is_never_offered() -> Result<()> {
    let (dir, sources) = backup_then_tamper()?;
    remove_file(dir.join(popopt::backup::copy_name(&sources[0])))?;
    let mut operator = ScriptedOperator::new([] as [&str; 0], [false, false]);
    let mut follow_ups = RecordingFollowUp::default();

    let report = restore_record(&dir, false, &mut operator, &mut follow_ups)?;

    assert_eq!(
        report.outcomes[0],
        RestoreOutcome::MissingCopy {
            source: sources[0].clone()
        }
    );
    assert_eq!(operator.asked().len(), 2);
    assert!(!operator.asked()[0].contains("fstab"));

    Ok(())
}

#[sealed_test]
fn bootloader_follow_up_needs_its_own_confirmation() -> Result<()> {
    let sources = live_files(&[("etc/default/grub", "GRUB_TIMEOUT=5\n")])?;
    let manager = BackupManager::new("backups", sources.clone(), false);
    let report = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;
    write(&sources[0], "GRUB_TIMEOUT=0\n")?;

    // Restore, but decline the follow-up.
    let mut operator = ScriptedOperator::new([] as [&str; 0], [true, false]);
    let mut follow_ups = RecordingFollowUp::default();
    restore_record(&report.dir, false, &mut operator, &mut follow_ups)?;
    assert_eq!(operator.asked().len(), 2);
    assert!(follow_ups.ran.is_empty());
    assert_eq!(read_to_string(&sources[0])?, "GRUB_TIMEOUT=5\n");

    // Restore with follow-up.
    let mut operator = ScriptedOperator::new([] as [&str; 0], [true, true]);
    let result = restore_record(&report.dir, false, &mut operator, &mut follow_ups)?;
    assert_eq!(follow_ups.ran, vec![FollowUp::RegenerateBootloader]);
    assert_eq!(
        result.outcomes,
        vec![RestoreOutcome::Restored {
            source: sources[0].clone(),
            follow_up_ran: true
        }]
    );

    // Declined restore never asks about the follow-up.
    let mut operator = ScriptedOperator::new([] as [&str; 0], [false]);
    restore_record(&report.dir, false, &mut operator, &mut follow_ups)?;
    assert_eq!(operator.asked().len(), 1);
    assert_eq!(follow_ups.ran.len(), 1);

    Ok(())
}

#[sealed_test]
fn generated_script_restores_confirmed_file() -> Result<()> {
    let (dir, sources) = backup_then_tamper()?;

    let mut child = Command::new("bash")
        .arg(dir.join(SCRIPT_FILE))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"n\nyes\nn\n")?;
    assert!(child.wait()?.success());

    assert_eq!(read_to_string(&sources[0])?, "tuned\n");
    assert_eq!(read_to_string(&sources[1])?, "sysctl original\n");
    assert_eq!(read_to_string(&sources[2])?, "tuned\n");

    Ok(())
}

#[sealed_test]
fn restore_rejects_directory_without_manifest() -> Result<()> {
    std::fs::create_dir_all("not-a-backup")?;
    let mut operator = ScriptedOperator::always_yes();
    let mut follow_ups = RecordingFollowUp::default();

    let result = restore_record(
        std::path::Path::new("not-a-backup"),
        false,
        &mut operator,
        &mut follow_ups,
    );
    assert!(result.is_err());
    assert!(operator.asked().is_empty());

    Ok(())
}

#[sealed_test]
fn colliding_copy_names_restore_their_own_bytes() -> Result<()> {
    let sources = live_files(&[("a_b", "flat original\n"), ("a/b", "nested original\n")])?;
    let manager = BackupManager::new("backups", sources.clone(), false);
    let report = manager.create_with_id("20250101_120000", "2025-01-01 12:00:00")?;
    assert_eq!(copy_count(&report.dir)?, 2);
    assert_eq!(report.captured().count(), 2);

    for source in &sources {
        write(source, "tuned\n")?;
    }

    let mut operator = ScriptedOperator::new([] as [&str; 0], [true, false]);
    let mut follow_ups = RecordingFollowUp::default();
    restore_record(&report.dir, false, &mut operator, &mut follow_ups)?;

    assert_eq!(read_to_string(&sources[0])?, "flat original\n");
    assert_eq!(read_to_string(&sources[1])?, "tuned\n");

    let mut operator = ScriptedOperator::new([] as [&str; 0], [false, true]);
    restore_record(&report.dir, false, &mut operator, &mut follow_ups)?;
    assert_eq!(read_to_string(&sources[1])?, "nested original\n");

    Ok(())
}
