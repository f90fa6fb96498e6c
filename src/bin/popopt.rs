// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use popopt::{
    backup::{
        restore::{restore_record, RestoreOutcome, SystemFollowUp},
        CaptureOutcome,
    },
    context::Context,
    dispatch::{CompositeOutcome, Dispatcher, SystemRunner},
    monitor::{Dashboard, SystemMonitor},
    optimize::OptimizationStatus,
    path::default_config_file,
    privilege::ensure_unprivileged,
    prompt::{InquireOperator, ScriptedOperator},
};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "popopt [options] [<command>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = match self.config {
            Some(path) => path,
            None => default_config_file()?,
        };
        let context = Context::load(config)?;

        match self.command.unwrap_or(Command::Menu) {
            Command::Menu => run_menu(context),
            Command::Backup => run_backup(context),
            Command::Optimize(opts) => run_optimize(context, opts),
            Command::Status => run_status(context),
            Command::Dashboard(opts) => run_dashboard(context, opts),
            Command::Restore(opts) => run_restore(context, opts),
            Command::List => run_list(context),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Show interactive menu (default).
    #[command(override_usage = "popopt menu [options]")]
    Menu,

    /// Capture configuration files into a new backup record.
    #[command(override_usage = "popopt backup [options]")]
    Backup,

    /// Run complete optimization sequence.
    #[command(override_usage = "popopt optimize [options]")]
    Optimize(OptimizeOptions),

    /// Show system metrics and which optimizations are in effect.
    #[command(override_usage = "popopt status [options]")]
    Status,

    /// Continuously redraw system metrics and optimization status.
    #[command(override_usage = "popopt dashboard [options]")]
    Dashboard(DashboardOptions),

    /// Interactively restore files from a backup record.
    #[command(override_usage = "popopt restore [options] <backup_dir>")]
    Restore(RestoreOptions),

    /// List backup records, oldest first.
    #[command(override_usage = "popopt list [options]")]
    List,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct OptimizeOptions {
    /// Start without asking for confirmation. Never reboots.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DashboardOptions {
    /// Seconds between redraws.
    #[arg(short, long, default_value_t = 2, value_name = "seconds")]
    pub interval: u64,

    /// Stop after this many redraws.
    #[arg(short, long, value_name = "count")]
    pub frames: Option<u64>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RestoreOptions {
    /// Backup record directory to restore from.
    #[arg(required = true, value_name = "backup_dir")]
    pub backup_dir: PathBuf,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = ensure_unprivileged() {
        error!("{error}");
        exit(1);
    }

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_menu(context: Context) -> Result<()> {
    let runner = SystemRunner::new(context.settings.clone());
    let mut dispatcher = Dispatcher::new(context, runner, InquireOperator::new());
    dispatcher.run()?;

    Ok(())
}

fn run_backup(context: Context) -> Result<()> {
    let report = context.backup_manager()?.create()?;
    let skipped = report.skipped().count();
    context.journal.record(format!(
        "Backup created at {} ({} captured, {skipped} skipped)",
        report.dir.display(),
        report.captured().count(),
    ))?;

    for outcome in report.skipped() {
        if let CaptureOutcome::Skipped { source, reason } = outcome {
            warn!("not captured: {} ({reason})", source.display());
        }
    }
    println!("{}", report.dir.display());

    Ok(())
}

fn run_optimize(context: Context, opts: OptimizeOptions) -> Result<()> {
    let runner = SystemRunner::new(context.settings.clone());
    let outcome = if opts.yes {
        // INVARIANT: Confirm the start only, decline the reboot.
        Dispatcher::new(context, runner, ScriptedOperator::new([] as [&str; 0], [true]))
            .complete_optimization()?
    } else {
        Dispatcher::new(context, runner, InquireOperator::new()).complete_optimization()?
    };

    if let CompositeOutcome::Aborted { failed, code } = outcome {
        bail!(
            "complete optimization aborted at {} (exit code {code})",
            failed.description()
        );
    }

    Ok(())
}

fn run_status(context: Context) -> Result<()> {
    println!("{}", SystemMonitor::new().sample());
    print!("{}", OptimizationStatus::probe(&context.settings));
    Ok(())
}

fn run_dashboard(context: Context, opts: DashboardOptions) -> Result<()> {
    let interval = Duration::from_secs(opts.interval.max(1));
    Dashboard::new(context.settings).run(interval, opts.frames);
    Ok(())
}

fn run_restore(context: Context, opts: RestoreOptions) -> Result<()> {
    let use_sudo = context.settings.use_sudo();
    let report = restore_record(
        &opts.backup_dir,
        use_sudo,
        &mut InquireOperator::new(),
        &mut SystemFollowUp::new(use_sudo),
    )?;

    for outcome in &report.outcomes {
        if let RestoreOutcome::Restored { source, .. } = outcome {
            context
                .journal
                .record(format!("Restored {} from {}", source.display(), opts.backup_dir.display()))?;
        }
    }
    info!("{} file(s) restored", report.restored());

    Ok(())
}

fn run_list(context: Context) -> Result<()> {
    for record in context.backup_manager()?.list()? {
        println!("{}", record.display());
    }

    Ok(())
}
