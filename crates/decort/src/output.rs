//! Output formatting: table, JSON, YAML.
//!
//! Table uses `tabled`, structured formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Short status line for stderr, green when color is on.
pub fn success(message: &str, color: ColorMode) -> String {
    if should_color(color) {
        format!("{} {message}", "ok".green().bold())
    } else {
        format!("ok {message}")
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render rows in the chosen format; structured formats serialize `data`.
pub fn render_list<T, R>(format: OutputFormat, data: &[T], to_row: impl Fn(&T) -> R) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// State documents are always structured; `table` falls back to JSON.
pub fn render_document<T: serde::Serialize + ?Sized>(format: OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Table | OutputFormat::Json => render_json(data),
    }
}

pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

pub fn print_status(message: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{message}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_default()
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_default()
}
