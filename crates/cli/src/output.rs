//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

/// Disk sizes at or above this many GB are shown in TB
const DISK_TB_THRESHOLD_GB: u32 = 1000;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a monthly price in EUR
pub fn format_price(amount: f64) -> String {
    format!("€{:.2}", amount)
}

/// Summarise one disk class, grouping identical sizes: `2x 2TB 1x 512GB`
pub fn format_disks(sizes: &[u32]) -> String {
    let mut groups: BTreeMap<u32, usize> = BTreeMap::new();
    for &size in sizes {
        *groups.entry(size).or_default() += 1;
    }

    groups
        .into_iter()
        .map(|(size, count)| {
            if size >= DISK_TB_THRESHOLD_GB {
                format!("{}x {}TB", count, f64::from(size) / f64::from(DISK_TB_THRESHOLD_GB))
            } else {
                format!("{}x {}GB", count, size)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format the time left until the next auction price drop
pub fn format_countdown(seconds: i64) -> String {
    if seconds <= 0 {
        return "-".to_string();
    }

    let remaining = chrono::Duration::seconds(seconds);
    if remaining.num_days() > 0 {
        format!("{}d {}h", remaining.num_days(), remaining.num_hours() % 24)
    } else if remaining.num_hours() > 0 {
        format!("{}h {}m", remaining.num_hours(), remaining.num_minutes() % 60)
    } else {
        format!("{}m", remaining.num_minutes().max(1))
    }
}

/// Color a visible/total count by how much the filter narrowed it
pub fn color_count(visible: usize, total: usize) -> String {
    let formatted = format!("{}/{}", visible, total);
    if visible == 0 {
        formatted.red().to_string()
    } else if visible < total {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
