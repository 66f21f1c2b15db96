//! Rendering of app listings, hook results and the engine journal.

use serde::Serialize;
use serde_json::Value;
use tabled::{Table, Tabled};

use antengine_apps::manager::LogEntry;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("\"unserializable: {e}\""))
}

/// Rows as a table, or as a JSON array.
pub fn print_rows<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(rows)),
        OutputFormat::Table if rows.is_empty() => println!("No apps found under the app root."),
        OutputFormat::Table => println!("{}", Table::new(rows)),
    }
}

/// A JSON document. In table mode objects print one key per line.
pub fn print_value(value: &Value, format: OutputFormat) {
    match (format, value) {
        (OutputFormat::Table, Value::Object(map)) if map.is_empty() => {
            println!("(no app returned a result)");
        }
        (OutputFormat::Table, Value::Object(map)) => {
            for (key, value) in map {
                print_kv(key, &value.to_string());
            }
        }
        _ => println!("{}", to_json(value)),
    }
}

/// Journal entries written while the command ran.
pub fn print_journal(entries: &[LogEntry], format: OutputFormat) {
    if entries.is_empty() {
        return;
    }
    match format {
        OutputFormat::Json => eprintln!("{}", to_json(entries)),
        OutputFormat::Table => {
            for entry in entries {
                eprintln!("[{}] {}: {}", entry.at.format("%H:%M:%S"), entry.app, entry.message);
            }
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {value}", format!("{key}:"));
}
