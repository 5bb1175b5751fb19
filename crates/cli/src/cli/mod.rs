// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::colors;
use crate::help;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.trim().to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "syncguard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
#[command(about = "Run syncthing only when power and network conditions allow it")]
#[command(
    long_about = "Run syncthing only when power and network conditions allow it.\n\n\
    A background supervisor watches the charger, the active network and the global sync \
    switch, and starts or stops syncthing to match your run conditions."
)]
#[command(help_template = help::template())]
#[command(before_help = help::commands())]
#[command(after_help = help::quickstart())]
#[command(styles = help::styles())]
// Allow the unit type field pattern which is required for clap's ArgAction::Version/Help
#[allow(clippy::manual_non_exhaustive)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long = "version", action = clap::ArgAction::Version)]
    version: (),

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Supervisor
    // ─────────────────────────────────────────────────────────────────────────
    /// Start the supervisor in the background
    Start,

    /// Stop the supervisor and the daemon it runs
    Stop,

    /// Show daemon state and why it is not running
    #[command(after_help = colors::examples("\
Examples:
  syncguard status            Human readable summary
  syncguard status -o json    Machine readable status"))]
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Evaluate run conditions now, without a running supervisor
    #[command(after_help = colors::examples("\
Examples:
  syncguard check             Print the decision and its reasons
  syncguard check -o json     Include the sensor readings"))]
    Check {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Turn global sync off until resumed
    Pause,

    /// Turn global sync back on
    Resume,

    /// Show the supervisor log (or the daemon's output with --daemon)
    #[command(after_help = colors::examples("\
Examples:
  syncguard logs              Print the supervisor log
  syncguard logs -f           Follow the supervisor log
  syncguard logs --daemon     Print syncthing's own output"))]
    Logs {
        /// Follow the log
        #[arg(long, short)]
        follow: bool,

        /// Show the daemon's output log instead
        #[arg(long)]
        daemon: bool,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Daemon
    // ─────────────────────────────────────────────────────────────────────────
    /// Restart the daemon
    Restart,

    /// Rebuild the daemon's index database
    ResetDatabase,

    /// Reset the daemon's delta indexes
    ResetDeltas,

    /// Re-read network state and re-evaluate run conditions
    Refresh,

    /// Ignore a device that asked to connect
    #[command(
        arg_required_else_help = true,
        after_help = colors::examples("\
Examples:
  syncguard ignore-device <id>                    Ignore by device ID
  syncguard ignore-device <id> --name laptop      Record a name with it")
    )]
    IgnoreDevice {
        /// Device ID
        #[arg(value_parser = non_empty_string)]
        device_id: String,

        /// Device name to record
        #[arg(long, default_value = "")]
        name: String,

        /// Address the device connected from
        #[arg(long, default_value = "")]
        address: String,
    },

    /// Ignore a folder a device offered to share
    #[command(arg_required_else_help = true)]
    IgnoreFolder {
        /// Device ID that offered the folder
        #[arg(value_parser = non_empty_string)]
        device_id: String,

        /// Folder ID
        #[arg(value_parser = non_empty_string)]
        folder_id: String,

        /// Folder label to record
        #[arg(long, default_value = "")]
        label: String,
    },

    /// Override remote changes on a send-only folder
    #[command(arg_required_else_help = true)]
    Override {
        /// Folder ID
        #[arg(value_parser = non_empty_string)]
        folder_id: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Setup
    // ─────────────────────────────────────────────────────────────────────────
    /// Generate shell completions
    #[command(
        arg_required_else_help = true,
        after_help = colors::examples("\
Examples:
  syncguard completion bash > ~/.local/share/bash-completion/completions/syncguard
  syncguard completion zsh > ~/.zfunc/_syncguard")
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
