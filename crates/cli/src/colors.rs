// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal colors for help and status output.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

use sg_core::LifecycleState;

use crate::env;

/// ANSI 256-color codes.
pub mod codes {
    /// Section headers: pastel cyan/steel blue
    pub const HEADER: u8 = 74;
    /// Commands/literals: light grey
    pub const LITERAL: u8 = 250;
    /// Placeholders and hints: medium grey
    pub const CONTEXT: u8 = 245;
    /// Daemon running
    pub const GOOD: u8 = 114;
    /// Daemon in transition
    pub const PENDING: u8 = 179;
    /// Daemon stopped or failed
    pub const BAD: u8 = 167;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if env::no_color() {
        return false;
    }
    if env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

fn paint(code: u8, text: &str) -> String {
    format!("{}{}{}", fg256(code), text, RESET)
}

/// Apply header color (section titles) to text.
pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

/// Apply literal color (commands, options) to text.
pub fn literal(text: &str) -> String {
    paint(codes::LITERAL, text)
}

/// Apply context color (placeholders, hints) to text.
pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

/// Color code for a lifecycle state.
pub fn state_code(state: LifecycleState) -> u8 {
    match state {
        LifecycleState::Active => codes::GOOD,
        LifecycleState::Starting | LifecycleState::Init => codes::PENDING,
        LifecycleState::Disabled | LifecycleState::Error => codes::BAD,
    }
}

/// Render a lifecycle state, colored when `colorize` is set.
pub fn state(state: LifecycleState, colorize: bool) -> String {
    if colorize {
        paint(state_code(state), state.as_str())
    } else {
        state.as_str().to_string()
    }
}

/// Colorize an examples help block when the terminal allows it.
pub fn examples(text: &str) -> String {
    if should_colorize() {
        colorize_examples(text)
    } else {
        text.to_string()
    }
}

/// Colorize an examples block.
///
/// ```text
/// Examples:
///   syncguard ignore-device <id>    Ignore a device
/// ```
///
/// Lines ending with `:` become headers; the command part of an example
/// line (everything before a run of two or more spaces) is colored as a
/// literal with `<placeholders>` dimmed.
pub fn colorize_examples(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];

        if trimmed.ends_with(':') && !trimmed.contains("  ") {
            lines.push(format!("{indent}{}", header(trimmed)));
        } else if let Some(end) = find_description_start(trimmed) {
            let (cmd, desc) = trimmed.split_at(end);
            lines.push(format!("{indent}{}{desc}", colorize_command(cmd)));
        } else {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

/// Colorize a command: words as literals, `<placeholders>` as context.
pub fn colorize_command(cmd: &str) -> String {
    cmd.split(' ')
        .map(|word| {
            if word.is_empty() {
                String::new()
            } else if word.starts_with('<') && word.ends_with('>') {
                context(word)
            } else {
                literal(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find where the description starts (the first run of 2+ spaces).
pub fn find_description_start(line: &str) -> Option<usize> {
    let start = line.find("  ")?;
    let rest = &line[start..];
    let desc = rest.trim_start();
    (!desc.is_empty()).then_some(start)
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
