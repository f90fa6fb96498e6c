// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Built-in optimizers.
//!
//! Popopt tunes the CPU and memory subsystems itself. Everything else, e.g.,
//! SSD scheduling, desktop effects, or background services, is left to
//! external optimizer scripts run by the dispatcher.
//!
//! Optimizers never fail outright over a missing tool or an unsupported
//! feature. They warn, skip the affected step, and carry on with whatever
//! else they can do.

pub mod cpu;
pub mod memory;
pub mod status;

pub use cpu::{BoostOutcome, CpuOptimizer, CpuReport};
pub use memory::{MemoryOptimizer, MemoryReport};
pub use status::OptimizationStatus;
