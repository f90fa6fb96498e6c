// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Live system metrics.
//!
//! A [`SystemMonitor`] samples CPU, memory, swap, root disk, I/O throughput,
//! and temperature through sysinfo. I/O throughput is a rate, so it is
//! computed from the difference between two consecutive samples of the
//! cumulative counters. The very first sample of a monitor reports zero
//! throughput.
//!
//! The [`Dashboard`] redraws metrics, optimization status, and the busiest
//! processes at a fixed interval until interrupted.

use crate::{
    config::Settings,
    optimize::OptimizationStatus,
    process::{syscall_non_interactive, tool_available},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
    thread::sleep,
    time::{Duration, Instant},
};
use sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System};
use tracing::{debug, instrument};

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const BAR_WIDTH: usize = 10;
const NAME_WIDTH: usize = 18;

/// Number of processes shown by the dashboard.
pub const TOP_PROCESSES: usize = 8;

/// Cumulative I/O counters since boot, in bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoCounters {
    pub disk_read: u64,
    pub disk_written: u64,
    pub net_received: u64,
    pub net_transmitted: u64,
}

impl IoCounters {
    /// Throughput between `earlier` and this sample over `elapsed` time.
    ///
    /// Counters that went backwards, e.g., because a busy process exited,
    /// count as zero.
    pub fn rates_since(&self, earlier: &IoCounters, elapsed: Duration) -> IoRates {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return IoRates::default();
        }

        let rate = |now: u64, then: u64| now.saturating_sub(then) as f64 / seconds;
        IoRates {
            disk_read: rate(self.disk_read, earlier.disk_read),
            disk_write: rate(self.disk_written, earlier.disk_written),
            net_received: rate(self.net_received, earlier.net_received),
            net_sent: rate(self.net_transmitted, earlier.net_transmitted),
        }
    }
}

/// I/O throughput in bytes per second.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct IoRates {
    pub disk_read: f64,
    pub disk_write: f64,
    pub net_received: f64,
    pub net_sent: f64,
}

/// Point in time view of system load.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metrics {
    pub cpu_percent: f32,
    pub cpu_frequency: u64,
    pub cpu_cores: usize,
    pub load_average: [f64; 3],
    pub temperature: Option<f32>,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub disk_total: u64,
    pub disk_available: u64,
    pub rates: IoRates,
    pub uptime: u64,
}

impl Display for Metrics {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let cpu = self.cpu_percent as f64;
        let memory = percent(self.memory_used, self.memory_total);
        let swap = percent(self.swap_used, self.swap_total);
        let disk = percent(
            self.disk_total.saturating_sub(self.disk_available),
            self.disk_total,
        );
        let [one, five, fifteen] = self.load_average;

        writeln!(fmt, "System Metrics")?;
        writeln!(fmt, "  CPU usage:      {cpu:>5.1}% {}", usage_bar(cpu))?;
        writeln!(
            fmt,
            "  CPU frequency:  {} MHz ({} cores)",
            self.cpu_frequency, self.cpu_cores
        )?;
        writeln!(fmt, "  Load average:   {one:.2} {five:.2} {fifteen:.2}")?;
        if let Some(temperature) = self.temperature {
            writeln!(fmt, "  Temperature:    {temperature:.1} °C")?;
        }
        writeln!(fmt, "  Memory:         {memory:>5.1}% {}", usage_bar(memory))?;
        writeln!(
            fmt,
            "  Memory size:    {:.1} GiB free / {:.1} GiB total",
            gib(self.memory_available),
            gib(self.memory_total)
        )?;
        writeln!(fmt, "  Swap usage:     {swap:>5.1}% {}", usage_bar(swap))?;
        writeln!(fmt, "  Disk usage:     {disk:>5.1}% {}", usage_bar(disk))?;
        writeln!(
            fmt,
            "  Disk I/O:       R {:.1} MB/s  W {:.1} MB/s",
            self.rates.disk_read / MIB,
            self.rates.disk_write / MIB
        )?;
        writeln!(
            fmt,
            "  Network I/O:    down {:.1} MB/s  up {:.1} MB/s",
            self.rates.net_received / MIB,
            self.rates.net_sent / MIB
        )?;
        writeln!(fmt, "  Uptime:         {}", format_duration(self.uptime))
    }
}

/// One row of the busiest process table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f64,
    pub status: String,
}

/// Busiest processes, rendered as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessTable(pub Vec<ProcessEntry>);

impl Display for ProcessTable {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "Top Processes")?;
        writeln!(
            fmt,
            "  {:>8}  {:<21}  {:>6}  {:>7}  STATUS",
            "PID", "PROCESS", "CPU%", "MEMORY%"
        )?;
        for entry in &self.0 {
            writeln!(
                fmt,
                "  {:>8}  {:<21}  {:>6.1}  {:>7.1}  {}",
                entry.pid,
                truncate_name(&entry.name),
                entry.cpu_percent,
                entry.memory_percent,
                entry.status
            )?;
        }

        Ok(())
    }
}

/// Sample system metrics over time.
#[derive(Debug)]
pub struct SystemMonitor {
    system: System,
    last: Option<(Instant, IoCounters)>,
}

impl SystemMonitor {
    /// Construct new monitor.
    ///
    /// Blocks briefly, because CPU usage needs two refreshes a minimum
    /// interval apart before it means anything.
    pub fn new() -> Self {
        let mut system = System::new_all();
        sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_all();

        Self { system, last: None }
    }

    /// Take a fresh sample.
    #[instrument(skip(self), level = "debug")]
    pub fn sample(&mut self) -> Metrics {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let now = Instant::now();
        let counters = self.io_counters();
        let rates = match self.last {
            Some((then, earlier)) => counters.rates_since(&earlier, now.duration_since(then)),
            None => IoRates::default(),
        };
        self.last = Some((now, counters));

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"));
        let components = Components::new_with_refreshed_list();
        let temperature = cpu_temperature(
            components
                .list()
                .iter()
                .map(|component| (component.label(), component.temperature())),
        );
        let load = System::load_average();

        Metrics {
            cpu_percent: self.system.global_cpu_usage(),
            cpu_frequency: self.system.cpus().first().map(|cpu| cpu.frequency()).unwrap_or(0),
            cpu_cores: self.system.cpus().len(),
            load_average: [load.one, load.five, load.fifteen],
            temperature,
            memory_total: self.system.total_memory(),
            memory_used: self.system.used_memory(),
            memory_available: self.system.available_memory(),
            swap_total: self.system.total_swap(),
            swap_used: self.system.used_swap(),
            disk_total: root.map(|disk| disk.total_space()).unwrap_or(0),
            disk_available: root.map(|disk| disk.available_space()).unwrap_or(0),
            rates,
            uptime: System::uptime(),
        }
    }

    /// Processes with the highest CPU usage as of the last sample.
    ///
    /// Idle processes are left out.
    pub fn top_processes(&self, count: usize) -> ProcessTable {
        let total = self.system.total_memory();
        let mut entries = self
            .system
            .processes()
            .values()
            .filter(|process| process.cpu_usage() > 0.0)
            .map(|process| ProcessEntry {
                pid: process.pid().as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                cpu_percent: process.cpu_usage(),
                memory_percent: percent(process.memory(), total),
                status: process.status().to_string(),
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
        entries.truncate(count);

        ProcessTable(entries)
    }

    fn io_counters(&self) -> IoCounters {
        let mut counters = IoCounters::default();
        for process in self.system.processes().values() {
            let usage = process.disk_usage();
            counters.disk_read += usage.total_read_bytes;
            counters.disk_written += usage.total_written_bytes;
        }

        let networks = Networks::new_with_refreshed_list();
        for (_, network) in &networks {
            counters.net_received += network.total_received();
            counters.net_transmitted += network.total_transmitted();
        }

        counters
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically redrawn overview of metrics, status, and busy processes.
#[derive(Debug)]
pub struct Dashboard {
    settings: Settings,
    monitor: SystemMonitor,
}

impl Dashboard {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            monitor: SystemMonitor::new(),
        }
    }

    /// Render one full frame.
    pub fn render_frame(&mut self) -> String {
        let metrics = self.monitor.sample();
        let status = OptimizationStatus::probe(&self.settings);
        let processes = self.monitor.top_processes(TOP_PROCESSES);

        format!("Pop!_OS Optimizer Dashboard\n\n{metrics}\n{status}\n{processes}")
    }

    /// Redraw every `interval` until interrupted, or until `frames` frames
    /// were shown.
    pub fn run(&mut self, interval: Duration, frames: Option<u64>) {
        let mut shown = 0;
        while frames.is_none_or(|limit| shown < limit) {
            let frame = self.render_frame();
            print!("\x1b[2J\x1b[H{frame}\nPress Ctrl-C to quit.\n");
            shown += 1;

            if frames.is_none_or(|limit| shown < limit) {
                sleep(interval);
            }
        }
    }
}

/// List block devices through `lsblk`.
///
/// Returns `None` if `lsblk` is missing or fails.
pub fn storage_devices() -> Option<String> {
    if !tool_available("lsblk") {
        debug!("lsblk not found");
        return None;
    }

    syscall_non_interactive("lsblk", ["-d", "-o", "NAME,SIZE,MODEL"])
        .inspect_err(|error| debug!("{error}"))
        .ok()
}

/// Pick CPU package temperature out of sensor readings.
pub(crate) fn cpu_temperature<'a>(
    readings: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Option<f32> {
    readings.into_iter().find_map(|(label, temperature)| {
        let label = label.to_lowercase();
        let is_cpu = ["coretemp", "k10temp", "cpu", "package"]
            .iter()
            .any(|name| label.contains(name));
        if is_cpu {
            temperature
        } else {
            None
        }
    })
}

/// Convert bytes to GiB.
pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Render seconds as days, hours, and minutes.
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    match days {
        0 => format!("{hours}h {minutes}m"),
        _ => format!("{days}d {hours}h {minutes}m"),
    }
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    match total {
        0 => 0.0,
        total => part as f64 / total as f64 * 100.0,
    }
}

pub(crate) fn usage_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(crate) fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        format!("{}...", name.chars().take(NAME_WIDTH).collect::<String>())
    } else {
        name.to_string()
    }
}
