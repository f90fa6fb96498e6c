// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{fixture_context, RecordingRunner};

use anyhow::Result;
use popopt::{
    config::Settings,
    context::Context,
    dispatch::{
        Action, ActionRunner, CompositeOutcome, Dispatcher, Flow, MenuEntry, SystemRunner,
        COMPOSITE_SEQUENCE, MENU,
    },
    journal::Journal,
    process::EXIT_NOT_STARTED,
    prompt::ScriptedOperator,
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs::{create_dir_all, read_to_string, write};

fn no_input() -> ScriptedOperator {
    ScriptedOperator::new([] as [&str; 0], [] as [bool; 0])
}

#[sealed_test]
fn every_key_runs_one_action_and_logs_one_line() -> Result<()> {
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), no_input());

    let actions = MENU
        .iter()
        .filter_map(|(key, entry)| match entry {
            MenuEntry::Run(action) => Some((*key, *action)),
            _ => None,
        })
        .collect::<Vec<_>>();

    for (count, (key, action)) in actions.iter().enumerate() {
        assert_eq!(dispatcher.dispatch(&key.to_string())?, Flow::Continue);
        assert_eq!(dispatcher.runner().invoked.len(), count + 1);
        assert_eq!(dispatcher.runner().invoked.last(), Some(action));

        let lines = dispatcher.context().journal.lines()?;
        assert_eq!(lines.len(), count + 1);
        assert!(lines[count].ends_with(&format!("SUCCESS: {}", action.description())));
    }

    Ok(())
}

#[sealed_test]
fn invalid_key_changes_nothing() -> Result<()> {
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), no_input());

    for input in ["42", "abc", "", "42"] {
        assert_eq!(dispatcher.dispatch(input)?, Flow::Continue);
    }

    assert!(dispatcher.runner().invoked.is_empty());
    assert!(dispatcher.context().journal.lines()?.is_empty());
    assert!(dispatcher.operator().asked().is_empty());

    Ok(())
}

#[sealed_test]
fn exit_key_ends_the_loop() -> Result<()> {
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), no_input());

    assert_eq!(dispatcher.dispatch("0")?, Flow::Exit);
    assert!(dispatcher.runner().invoked.is_empty());

    Ok(())
}

#[sealed_test]
fn failed_action_is_logged_and_not_fatal() -> Result<()> {
    let runner = RecordingRunner::new().failing(Action::OptimizeSsd, 2);
    let mut dispatcher = Dispatcher::new(fixture_context()?, runner, no_input());

    assert_eq!(dispatcher.dispatch("4")?, Flow::Continue);
    assert_eq!(dispatcher.dispatch("5")?, Flow::Continue);

    let lines = dispatcher.context().journal.lines()?;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("FAILED: Optimize SSD (exit code 2)"));
    assert!(lines[1].ends_with("SUCCESS: Optimize desktop"));

    Ok(())
}

#[sealed_test]
fn run_loop_stops_at_exit_key() -> Result<()> {
    let operator = ScriptedOperator::new(["1", "nope", "0", "2"], [] as [bool; 0]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), operator);

    dispatcher.run()?;
    assert_eq!(dispatcher.runner().invoked, vec![Action::Backup]);

    Ok(())
}

#[sealed_test]
fn run_loop_stops_at_end_of_input() -> Result<()> {
    let operator = ScriptedOperator::new(["3"], [] as [bool; 0]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), operator);

    dispatcher.run()?;
    assert_eq!(dispatcher.runner().invoked, vec![Action::OptimizeMemory]);

    Ok(())
}

#[sealed_test]
fn composite_aborts_at_first_failure() -> Result<()> {
    let runner = RecordingRunner::new().failing(Action::OptimizeMemory, 1);
    let operator = ScriptedOperator::new([] as [&str; 0], [true, true]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, runner, operator);

    let outcome = dispatcher.complete_optimization()?;
    assert_eq!(
        outcome,
        CompositeOutcome::Aborted {
            failed: Action::OptimizeMemory,
            code: 1
        }
    );
    assert_eq!(dispatcher.runner().invoked, COMPOSITE_SEQUENCE[..3].to_vec());
    assert_eq!(dispatcher.runner().reboots, 0);

    // No reboot question after an abort.
    assert_eq!(dispatcher.operator().asked().len(), 1);

    let lines = dispatcher.context().journal.lines()?;
    assert_eq!(lines.len(), 4);
    assert!(lines[2].ends_with("FAILED: Optimize memory (exit code 1)"));
    assert!(lines[3].contains("ABORTED: Complete optimization at Optimize memory"));

    Ok(())
}

#[sealed_test]
fn composite_declined_runs_nothing() -> Result<()> {
    let operator = ScriptedOperator::new([] as [&str; 0], [false]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), operator);

    assert_eq!(dispatcher.dispatch("9")?, Flow::Continue);
    assert!(dispatcher.runner().invoked.is_empty());
    assert!(dispatcher.context().journal.lines()?.is_empty());

    Ok(())
}

#[sealed_test]
fn composite_success_reboots_only_when_confirmed() -> Result<()> {
    let operator = ScriptedOperator::new([] as [&str; 0], [true, false]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), operator);

    assert_eq!(dispatcher.complete_optimization()?, CompositeOutcome::Completed);
    assert_eq!(dispatcher.runner().invoked, COMPOSITE_SEQUENCE.to_vec());
    assert_eq!(dispatcher.runner().reboots, 0);

    let operator = ScriptedOperator::new([] as [&str; 0], [true, true]);
    let mut dispatcher = Dispatcher::new(fixture_context()?, RecordingRunner::new(), operator);

    assert_eq!(dispatcher.complete_optimization()?, CompositeOutcome::Completed);
    assert_eq!(dispatcher.runner().reboots, 1);

    Ok(())
}

/// Settings for the real runner, with every location under the current directory.
fn local_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    create_dir_all(cwd.join("scripts"))?;

    Ok(Settings {
        backup_root: Some(cwd.join("backups")),
        log_file: Some(cwd.join("popopt.log")),
        scripts_dir: Some(cwd.join("scripts")),
        cpu_sysfs_dir: Some(cwd.join("sys/devices/system/cpu")),
        use_sudo: Some(false),
        ..Default::default()
    })
}

#[sealed_test]
fn missing_script_cannot_be_started() -> Result<()> {
    let mut runner = SystemRunner::new(local_settings()?);

    for action in [
        Action::OptimizeSsd,
        Action::OptimizeDesktop,
        Action::OptimizeServices,
        Action::ValidateHardware,
    ] {
        assert_eq!(runner.run(action), EXIT_NOT_STARTED);
    }

    Ok(())
}

#[sealed_test]
fn script_exit_code_is_propagated() -> Result<()> {
    let settings = local_settings()?;
    write(settings.scripts_dir().join("optimize_desktop.sh"), "exit 3\n")?;
    write(settings.scripts_dir().join("optimize_services.sh"), "exit 0\n")?;
    let mut runner = SystemRunner::new(settings);

    assert_eq!(runner.run(Action::OptimizeDesktop), 3);
    assert_eq!(runner.run(Action::OptimizeServices), 0);

    Ok(())
}

#[sealed_test]
fn unstartable_script_is_journaled_as_failure() -> Result<()> {
    let settings = local_settings()?;
    let journal = Journal::open(settings.log_file()?)?;
    let context = Context::new(settings.clone(), journal);
    let mut dispatcher = Dispatcher::new(context, SystemRunner::new(settings), no_input());

    assert_eq!(dispatcher.dispatch("4")?, Flow::Continue);

    let lines = dispatcher.context().journal.lines()?;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("FAILED: Optimize SSD (exit code 127)"));

    Ok(())
}

#[sealed_test]
fn cpu_action_runs_builtin_optimizer() -> Result<()> {
    let settings = local_settings()?;
    let cpufreq = settings.cpu_sysfs_dir().join("cpu0/cpufreq");
    create_dir_all(&cpufreq)?;
    write(cpufreq.join("scaling_governor"), "powersave")?;
    let mut runner = SystemRunner::new(settings);

    assert_eq!(runner.run(Action::OptimizeCpu), 0);
    assert_eq!(read_to_string(cpufreq.join("scaling_governor"))?, "performance");

    Ok(())
}

#[sealed_test(env = [("PATH", "")])]
fn memory_action_without_sysctl_still_succeeds() -> Result<()> {
    let mut runner = SystemRunner::new(local_settings()?);
    assert_eq!(runner.run(Action::OptimizeMemory), 0);

    Ok(())
}
