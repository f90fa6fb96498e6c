// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Generated restore script.
//!
//! Every backup record ships with a `restore.sh` that works without popopt
//! being installed. It walks the captured files in manifest order, and asks
//! before copying each one back over its live location. Bootloader
//! configuration additionally offers to run `update-grub`.

use crate::backup::manifest::BackupManifest;

use std::fmt::Write;

/// File name of the restore script inside a backup directory.
pub const SCRIPT_FILE: &str = "restore.sh";

/// Render restore script for a manifest.
///
/// Only entries listed in the manifest are offered, and each is guarded by an
/// existence check of its copy at run time.
pub fn render_restore_script(manifest: &BackupManifest, use_sudo: bool) -> String {
    let sudo = if use_sudo { "sudo " } else { "" };
    let mut script = String::new();

    script.push_str("#!/usr/bin/env bash\n");
    let _ = writeln!(
        script,
        "# Restore configuration files captured by backup {} ({}).",
        manifest.id, manifest.created
    );
    script.push_str(concat!(
        "set -u\n",
        "\n",
        "BACKUP_DIR=\"$(cd \"$(dirname \"${BASH_SOURCE[0]}\")\" && pwd)\"\n",
        "\n",
        "confirm() {\n",
        "    local answer\n",
        "    read -r -p \"$1 [y/N] \" answer\n",
        "    [[ \"$answer\" =~ ^[Yy]([Ee][Ss])?$ ]]\n",
        "}\n",
    ));

    for entry in &manifest.entries {
        let source = entry.source.to_string_lossy();
        let target = quote(&source);
        let copy = format!("\"$BACKUP_DIR\"/{}", quote(&entry.copy));

        script.push('\n');
        let _ = writeln!(script, "if [[ -f {copy} ]]; then");
        let _ = writeln!(script, "    if confirm {}; then", quote(&format!("Restore {source}?")));
        let _ = writeln!(script, "        if {sudo}cp {copy} {target}; then");
        let _ = writeln!(script, "            echo {}", quote(&format!("Restored {source}")));
        if let Some(follow_up) = entry.follow_up {
            let _ = writeln!(script, "            if confirm {}; then", quote(follow_up.question()));
            let _ = writeln!(script, "                {sudo}{}", follow_up.command());
            script.push_str("            fi\n");
        }
        script.push_str("        else\n");
        let _ = writeln!(
            script,
            "            echo {} >&2",
            quote(&format!("Failed to restore {source}"))
        );
        script.push_str("        fi\n");
        script.push_str("    fi\n");
        script.push_str("fi\n");
    }

    script.push_str("\necho 'Restore finished.'\n");
    script
}

// Single-quote for bash, closing and reopening around embedded quotes.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
