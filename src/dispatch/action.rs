// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static menu table.
//!
//! Menu keys map onto a closed set of entries. The table is fixed at compile
//! time, and cannot be extended at runtime.

use std::fmt::Write;

/// Unit of work the dispatcher can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Backup,
    OptimizeCpu,
    OptimizeMemory,
    OptimizeSsd,
    OptimizeDesktop,
    OptimizeServices,
    ValidateHardware,
    SystemInfo,
}

impl Action {
    /// Human readable name, also used in activity log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Backup => "Create backup",
            Self::OptimizeCpu => "Optimize CPU",
            Self::OptimizeMemory => "Optimize memory",
            Self::OptimizeSsd => "Optimize SSD",
            Self::OptimizeDesktop => "Optimize desktop",
            Self::OptimizeServices => "Optimize services",
            Self::ValidateHardware => "Validate hardware",
            Self::SystemInfo => "System information",
        }
    }

    /// External script implementing this action, if it is not built in.
    pub fn script(&self) -> Option<&'static str> {
        match self {
            Self::OptimizeSsd => Some("optimize_ssd.sh"),
            Self::OptimizeDesktop => Some("optimize_desktop.sh"),
            Self::OptimizeServices => Some("optimize_services.sh"),
            Self::ValidateHardware => Some("hardware_validator.sh"),
            Self::Backup | Self::OptimizeCpu | Self::OptimizeMemory | Self::SystemInfo => None,
        }
    }
}

/// Steps of the complete optimization, in order.
pub const COMPOSITE_SEQUENCE: [Action; 6] = [
    Action::Backup,
    Action::OptimizeCpu,
    Action::OptimizeMemory,
    Action::OptimizeSsd,
    Action::OptimizeDesktop,
    Action::OptimizeServices,
];

/// What a menu key stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    /// Run a single action.
    Run(Action),

    /// Run [`COMPOSITE_SEQUENCE`].
    Composite,

    /// Leave the menu.
    Exit,
}

impl MenuEntry {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Run(action) => action.description(),
            Self::Composite => "Complete optimization",
            Self::Exit => "Exit",
        }
    }
}

/// Menu keys in display order.
pub const MENU: [(u8, MenuEntry); 10] = [
    (1, MenuEntry::Run(Action::Backup)),
    (2, MenuEntry::Run(Action::OptimizeCpu)),
    (3, MenuEntry::Run(Action::OptimizeMemory)),
    (4, MenuEntry::Run(Action::OptimizeSsd)),
    (5, MenuEntry::Run(Action::OptimizeDesktop)),
    (6, MenuEntry::Run(Action::OptimizeServices)),
    (7, MenuEntry::Run(Action::ValidateHardware)),
    (8, MenuEntry::Run(Action::SystemInfo)),
    (9, MenuEntry::Composite),
    (0, MenuEntry::Exit),
];

/// Look up menu entry for one line of operator input.
pub fn lookup(input: &str) -> Option<MenuEntry> {
    let key = input.trim().parse::<u8>().ok()?;
    MENU.iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, entry)| *entry)
}

/// Render the menu as shown to the operator.
pub fn render_menu() -> String {
    let mut menu = String::from("MENU OPTIONS:\n");
    for (key, entry) in MENU {
        let _ = writeln!(menu, "  [{key}] {}", entry.description());
    }
    menu
}
