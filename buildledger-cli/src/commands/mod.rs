//! Subcommand handlers

pub mod config;
pub mod limits;
pub mod onboarding;
pub mod permissions;
pub mod session;

use colored::{ColoredString, Colorize};

fn mark(ok: bool) -> ColoredString {
    if ok {
        "✓".green()
    } else {
        "✗".red()
    }
}
