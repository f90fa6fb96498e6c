// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Linux desktop performance tuner.
//!
//! Popopt presents a fixed menu of tuning actions, runs the one the operator
//! picks, and keeps an append-only activity log of every outcome. Before
//! anything is tuned, the configuration files involved can be captured into a
//! timestamped __backup record__ that knows how to put them back.
//!
//! # See Also
//!
//! 1. [`dispatch`] for the menu loop.
//! 2. [`backup`] for backup record layout and restore.
//! 3. [`config`] for the configuration set.
//! 4. [`monitor`] for live system metrics.

pub mod backup;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod journal;
pub mod monitor;
pub mod optimize;
pub mod path;
pub mod privilege;
pub mod process;
pub mod prompt;
