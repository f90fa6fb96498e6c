// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Menu driven action dispatch.
//!
//! The dispatcher is a plain read-evaluate-print loop. It shows the menu,
//! reads one choice, runs the matching action, reports the outcome, and logs
//! one line to the activity log. Action failures are reported and logged, but
//! never end the loop. Only the exit key, or the end of operator input, does.
//!
//! # Complete Optimization
//!
//! One key runs the whole [`COMPOSITE_SEQUENCE`]: a backup first, then every
//! optimizer in a fixed order. The operator confirms before the sequence
//! starts. The first failing step aborts the remaining ones, but whatever
//! already ran stays applied. After a successful run the operator may reboot
//! the machine, again behind a confirmation.

pub mod action;

pub use action::{lookup, render_menu, Action, MenuEntry, COMPOSITE_SEQUENCE, MENU};

use crate::{
    backup::facts::SystemFacts,
    config::Settings,
    context::Context,
    monitor::{storage_devices, SystemMonitor},
    optimize::{CpuOptimizer, MemoryOptimizer, OptimizationStatus},
    process::{
        exit_code, privileged_call, syscall_interactive, tool_available, ProcessError,
        EXIT_NOT_STARTED,
    },
    prompt::{Operator, PromptError},
};

use tracing::{error, info, instrument, warn};

/// Layer of indirection for running actions.
pub trait ActionRunner {
    /// Run action to completion, and report its exit code.
    fn run(&mut self, action: Action) -> i32;

    /// Ask the system to reboot.
    fn reboot(&mut self) -> Result<(), ProcessError>;
}

/// Run actions against the real system.
///
/// Built-in actions run in process. Script actions run through `bash` from
/// the configured scripts directory, attached to the terminal.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    settings: Settings,
}

impl SystemRunner {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn backup(&self) -> i32 {
        let root = match self.settings.backup_root() {
            Ok(root) => root,
            Err(error) => {
                error!("{error}");
                return 1;
            }
        };

        let manager = crate::backup::BackupManager::new(
            root,
            self.settings.backup_files(),
            self.settings.use_sudo(),
        );
        match manager.create() {
            Ok(report) => {
                println!("Backup created at {}", report.dir.display());
                0
            }
            Err(error) => {
                error!("{error}");
                1
            }
        }
    }

    fn script(&self, script: &str) -> i32 {
        let path = self.settings.scripts_dir().join(script);
        if !path.is_file() {
            warn!("script {} not found", path.display());
            return EXIT_NOT_STARTED;
        }

        if !tool_available("bash") {
            warn!("bash not found, cannot run {}", path.display());
            return EXIT_NOT_STARTED;
        }

        match syscall_interactive("bash", [&path]) {
            Ok(status) => exit_code(status),
            Err(error) => {
                warn!("{error}");
                error.code()
            }
        }
    }

    fn system_info(&self) -> i32 {
        println!("{}", SystemFacts::gather());
        println!("{}", SystemMonitor::new().sample());
        println!("{}", OptimizationStatus::probe(&self.settings));
        match storage_devices() {
            Some(devices) => println!("Storage Devices\n{devices}"),
            None => warn!("cannot list storage devices"),
        }
        0
    }
}

impl ActionRunner for SystemRunner {
    #[instrument(skip(self), level = "debug")]
    fn run(&mut self, action: Action) -> i32 {
        match action {
            Action::Backup => self.backup(),
            Action::OptimizeCpu => CpuOptimizer::from_settings(&self.settings).run().exit_code(),
            Action::OptimizeMemory => {
                MemoryOptimizer::from_settings(&self.settings).run();
                0
            }
            Action::SystemInfo => self.system_info(),
            Action::OptimizeSsd
            | Action::OptimizeDesktop
            | Action::OptimizeServices
            | Action::ValidateHardware => action
                .script()
                .map_or(EXIT_NOT_STARTED, |script| self.script(script)),
        }
    }

    fn reboot(&mut self) -> Result<(), ProcessError> {
        privileged_call(self.settings.use_sudo(), "systemctl", ["reboot"]).map(|_| ())
    }
}

/// What the loop should do after one choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// How a complete optimization run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// Operator did not confirm the start.
    Declined,

    /// Every step succeeded.
    Completed,

    /// Given step failed, later steps never ran.
    Aborted { failed: Action, code: i32 },
}

/// Interactive menu dispatcher.
#[derive(Debug)]
pub struct Dispatcher<R, O>
where
    R: ActionRunner,
    O: Operator,
{
    context: Context,
    runner: R,
    operator: O,
}

impl<R, O> Dispatcher<R, O>
where
    R: ActionRunner,
    O: Operator,
{
    pub fn new(context: Context, runner: R, operator: O) -> Self {
        Self {
            context,
            runner,
            operator,
        }
    }

    /// Loop until the operator chooses to exit.
    ///
    /// # Errors
    ///
    /// - Return [`DispatchError::Prompt`] if operator input fails.
    pub fn run(&mut self) -> Result<()> {
        loop {
            println!("\n{}", render_menu());
            let Some(line) = self.operator.read_line("Select option")? else {
                break;
            };

            if self.dispatch(&line)? == Flow::Exit {
                break;
            }
        }

        info!("goodbye");
        Ok(())
    }

    /// Handle one line of operator input.
    ///
    /// # Errors
    ///
    /// - Return [`DispatchError::Prompt`] if operator input fails.
    pub fn dispatch(&mut self, input: &str) -> Result<Flow> {
        match lookup(input) {
            Some(MenuEntry::Run(action)) => {
                self.invoke(action);
            }
            Some(MenuEntry::Composite) => {
                self.complete_optimization()?;
            }
            Some(MenuEntry::Exit) => return Ok(Flow::Exit),
            None => warn!("invalid option {:?}", input.trim()),
        }

        Ok(Flow::Continue)
    }

    /// Run the complete optimization sequence.
    ///
    /// # Errors
    ///
    /// - Return [`DispatchError::Prompt`] if operator input fails.
    #[instrument(skip(self), level = "debug")]
    pub fn complete_optimization(&mut self) -> Result<CompositeOutcome> {
        let description = MenuEntry::Composite.description();
        if !self
            .operator
            .confirm("Run complete optimization? This will modify system settings")?
        {
            info!("complete optimization cancelled");
            return Ok(CompositeOutcome::Declined);
        }

        for action in COMPOSITE_SEQUENCE {
            let code = self.invoke(action);
            if code != 0 {
                error!("complete optimization aborted at {}", action.description());
                self.record(format!(
                    "ABORTED: {description} at {} (exit code {code})",
                    action.description()
                ));
                return Ok(CompositeOutcome::Aborted {
                    failed: action,
                    code,
                });
            }
        }

        info!("complete optimization finished");
        self.record(format!("SUCCESS: {description}"));

        if self.operator.confirm("Reboot now to apply all changes?")? {
            self.record("Reboot requested");
            if let Err(error) = self.runner.reboot() {
                warn!("reboot request failed: {error}");
            }
        }

        Ok(CompositeOutcome::Completed)
    }

    /// Run one action, report, and log its outcome. Returns its exit code.
    fn invoke(&mut self, action: Action) -> i32 {
        info!("running {}", action.description());
        let code = self.runner.run(action);
        if code == 0 {
            info!("{} completed successfully", action.description());
            self.record(format!("SUCCESS: {}", action.description()));
        } else {
            error!("{} failed with exit code {code}", action.description());
            self.record(format!(
                "FAILED: {} (exit code {code})",
                action.description()
            ));
        }

        code
    }

    fn record(&self, message: impl AsRef<str>) {
        if let Err(error) = self.context.journal.record(message) {
            warn!("{error}");
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }
}

/// Dispatch error types.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Friendly result alias :3
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
