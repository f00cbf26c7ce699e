//! Small colored-output helpers shared by the subcommands.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

/// Create a formatted table with the standard preset.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "ERROR:".bright_red().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "\u{2713}".bright_green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", "\u{2139}".bright_blue().bold(), msg);
}
