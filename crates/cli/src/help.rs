// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help text generation with colorization support.

use crate::colors;
use clap::builder::styling::Styles;

/// Generate clap Styles for help output.
pub fn styles() -> Styles {
    if !colors::should_colorize() {
        return Styles::plain();
    }

    use anstyle::{Ansi256Color, Color, Style};

    let fg = |code| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    let header = fg(colors::codes::HEADER);
    let context = fg(colors::codes::CONTEXT);

    Styles::styled()
        .header(header)
        .usage(header)
        .literal(fg(colors::codes::LITERAL))
        .placeholder(context)
        .valid(context)
}

/// Main help template with colorized Options header.
pub fn template() -> String {
    format!(
        "{{about-with-newline}}
{{usage-heading}} {{usage}}

{{before-help}}{}
{{options}}{{after-help}}",
        colors::header("Options:")
    )
}

/// Commands list shown before options in main help.
pub fn commands() -> String {
    let entries: [(&str, &[(&str, &str)]); 3] = [
        (
            "Supervisor:",
            &[
                ("start", "Start the supervisor"),
                ("stop", "Stop the supervisor and the daemon"),
                ("status", "Show daemon state and blocking reasons"),
                ("check", "Evaluate run conditions without a supervisor"),
                ("pause", "Turn global sync off"),
                ("resume", "Turn global sync back on"),
                ("logs", "Show supervisor or daemon logs"),
            ],
        ),
        (
            "Daemon:",
            &[
                ("restart", "Restart the daemon"),
                ("reset-database", "Rebuild the daemon's index database"),
                ("reset-deltas", "Reset delta indexes"),
                ("refresh", "Re-read network state and re-evaluate"),
                ("ignore-device", "Ignore a pending device"),
                ("ignore-folder", "Ignore a folder offered by a device"),
                ("override", "Override remote changes on a folder"),
            ],
        ),
        (
            "Setup:",
            &[("completion", "Generate shell completions")],
        ),
    ];

    let width = entries
        .iter()
        .flat_map(|(_, cmds)| cmds.iter().map(|(name, _)| name.len()))
        .max()
        .unwrap_or(0);

    let mut sections = Vec::new();
    for (title, cmds) in entries {
        let mut section = colors::header(title);
        for (name, about) in cmds {
            let pad = " ".repeat(width - name.len() + 2);
            section.push_str(&format!("\n  {}{pad}{about}", colors::literal(name)));
        }
        sections.push(section);
    }
    sections.join("\n\n")
}

/// Quickstart help shown after options in main help.
pub fn quickstart() -> String {
    colors::examples(
        "\
Get started:
  syncguard start          Start supervising syncthing
  syncguard status         See whether it runs, and why not
  syncguard check          Preview the decision for the current conditions
  syncguard pause          Stop syncing until 'syncguard resume'",
    )
}

#[cfg(test)]
#[path = "help_tests.rs"]
mod tests;
