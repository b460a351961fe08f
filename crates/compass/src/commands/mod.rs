pub mod completion;
pub mod config;
pub mod directions;
pub mod pois;
pub mod session;

use colored::Colorize;

use crate::notice::{Notice, Severity};

/// Print a notice as one coloured line.
pub fn print_notice(notice: &Notice) {
    let marker = match notice.severity {
        Severity::Success => "✓".green().bold(),
        Severity::Error => "✗".red().bold(),
        Severity::Info => "ℹ".blue().bold(),
    };
    println!("{marker} {}", notice.message);
}
