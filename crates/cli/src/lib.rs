// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sgrs - library behind the `syncguard` CLI.
//!
//! The CLI manages the `syncguardd` supervisor (start, stop, status, logs),
//! forwards daemon operations to it over its Unix socket, and evaluates run
//! conditions locally for `syncguard check`.

mod cli;
pub mod colors;
mod commands;
mod display;
pub mod env;
pub mod error;
pub mod help;
pub mod supervisor;

pub use cli::{Cli, Command, OutputFormat};
pub use error::{Error, Result};

use std::io::Write;

use clap::CommandFactory;
use clap_complete::generate;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    let state_dir = env::state_dir();
    let mut out = std::io::stdout().lock();

    match command {
        Command::Start => commands::supervisor::start(&state_dir, &mut out),
        Command::Stop => commands::supervisor::stop(&state_dir, &mut out),
        Command::Status { output } => commands::supervisor::status(&state_dir, output, &mut out),
        Command::Logs { follow, daemon } => {
            commands::supervisor::logs(&state_dir, follow, daemon, &mut out)
        }
        Command::Check { output } => {
            commands::check::run(&env::settings_path(), &state_dir, output, &mut out)
        }
        Command::Pause => {
            if commands::pause::pause(&state_dir)? {
                writeln!(out, "Sync paused.")?;
            } else {
                writeln!(out, "Sync is already paused.")?;
            }
            Ok(())
        }
        Command::Resume => {
            if commands::pause::resume(&state_dir)? {
                writeln!(out, "Sync resumed.")?;
            } else {
                writeln!(out, "Sync is not paused.")?;
            }
            Ok(())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "syncguard", &mut out);
            Ok(())
        }
        forwarded => match commands::control::request_for(forwarded) {
            Some((request, done)) => commands::control::run(&state_dir, &request, done, &mut out),
            None => Ok(()),
        },
    }
}
