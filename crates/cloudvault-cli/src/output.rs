//! Rendering of command results as tables, settings lines or JSON.
//!
//! Everything a command prints goes through [`Printer`] so that
//! `--format json` yields exactly one JSON document on stdout.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use cloudvault_core::error::AppError;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Writes command results in the format chosen on the command line.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Rows as a table or a JSON array. `empty` replaces an empty table.
    pub fn rows<T: Serialize + Tabled>(
        &self,
        out: &mut impl Write,
        rows: &[T],
        empty: &str,
    ) -> Result<(), AppError> {
        match self.format {
            OutputFormat::Table if rows.is_empty() => writeln!(out, "{empty}")?,
            OutputFormat::Table => {
                let mut table = Table::new(rows);
                table.with(Style::rounded());
                writeln!(out, "{table}")?;
            }
            OutputFormat::Json => write_json(out, rows)?,
        }
        Ok(())
    }

    /// A nested value as sorted `section.key = value` lines, or JSON.
    pub fn settings<T: Serialize>(&self, out: &mut impl Write, value: &T) -> Result<(), AppError> {
        match self.format {
            OutputFormat::Table => {
                let value = serde_json::to_value(value)?;
                for (key, value) in flatten(&value) {
                    writeln!(out, "{key} = {value}")?;
                }
            }
            OutputFormat::Json => write_json(out, value)?,
        }
        Ok(())
    }

    /// A confirmation line followed by labelled fields. As JSON, one object
    /// holding `message` and the fields under snake_case keys.
    pub fn confirm(
        &self,
        out: &mut impl Write,
        message: &str,
        fields: &[(&str, String)],
    ) -> Result<(), AppError> {
        match self.format {
            OutputFormat::Table => {
                writeln!(out, "✓ {message}")?;
                for (label, value) in fields {
                    writeln!(out, "  {:<12} {value}", format!("{label}:"))?;
                }
            }
            OutputFormat::Json => {
                let mut object = Map::new();
                object.insert("message".to_string(), Value::from(message));
                for (label, value) in fields {
                    object.insert(
                        label.to_lowercase().replace(' ', "_"),
                        Value::from(value.as_str()),
                    );
                }
                write_json(out, &object)?;
            }
        }
        Ok(())
    }
}

/// Print a failed command to stderr.
pub fn report_error(err: &AppError) {
    eprintln!("error[{}]: {}", err.kind, err.message);
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    flatten_into(String::new(), value, &mut lines);
    lines
}

fn flatten_into(prefix: String, value: &Value, lines: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(key, child, lines);
            }
        }
        Value::String(s) => lines.push((prefix, s.clone())),
        other => lines.push((prefix, other.to_string())),
    }
}
