// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::cli::Cli;
use clap::CommandFactory;

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn commands_list_every_subcommand() {
    let listed = strip_ansi(&commands());
    let cmd = Cli::command();
    for sub in cmd.get_subcommands() {
        if sub.is_hide_set() || sub.get_name() == "help" {
            continue;
        }
        assert!(
            listed.contains(&format!("  {} ", sub.get_name())),
            "command list is missing {}",
            sub.get_name()
        );
    }
}

#[test]
fn commands_are_aligned() {
    let listed = strip_ansi(&commands());
    let columns: Vec<usize> = listed
        .lines()
        .filter(|l| l.starts_with("  "))
        .map(|l| {
            let name_end = l[2..].find(' ').unwrap() + 2;
            name_end + l[name_end..].len() - l[name_end..].trim_start().len()
        })
        .collect();
    assert!(!columns.is_empty());
    assert!(columns.iter().all(|c| *c == columns[0]));
}

#[test]
fn template_has_clap_placeholders() {
    let t = strip_ansi(&template());
    assert!(t.contains("{usage}"));
    assert!(t.contains("{before-help}Options:"));
    assert!(t.contains("{after-help}"));
}

#[test]
fn quickstart_mentions_start() {
    assert!(strip_ansi(&quickstart()).contains("syncguard start"));
}
