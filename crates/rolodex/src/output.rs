//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use rolodex_core::{FieldValue, FieldView, LookupItem, WorkspaceView};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Color only when writing to a terminal and `NO_COLOR` is unset.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single item; tables use the pre-formatted `detail_fn` text.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, respecting quiet mode.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Workspace detail ─────────────────────────────────────────────────

/// Human-readable text of a workspace: fields, children and their
/// validation messages.
pub fn workspace_detail(view: &WorkspaceView, color: bool) -> String {
    let mut out = String::new();
    let id = view.id.map(|id| format!(" ({id})")).unwrap_or_default();
    if color {
        let _ = writeln!(out, "{}{id}", view.title.bold());
    } else {
        let _ = writeln!(out, "{}{id}", view.title);
    }

    let width = view
        .fields
        .iter()
        .chain(view.children.iter().flat_map(|c| c.fields.iter()))
        .map(|f| f.label.len() + 1)
        .max()
        .unwrap_or(0);

    for field in &view.fields {
        write_field(&mut out, "", field, &view.lookup, width, color);
    }

    for child in &view.children {
        let marker = if view.selected_child == Some(child.index) { '*' } else { ' ' };
        let _ = writeln!(out, "{marker}[{}] id {}", child.index, child.id);
        for field in &child.fields {
            write_field(&mut out, "    ", field, &[], width, color);
        }
    }

    let mut flags = Vec::new();
    if view.has_changes {
        flags.push("unsaved changes");
    }
    if view.has_errors {
        flags.push("has errors");
    }
    if !flags.is_empty() {
        let _ = write!(out, "({})", flags.join(", "));
    }
    out.trim_end().to_owned()
}

fn write_field(
    out: &mut String,
    indent: &str,
    field: &FieldView,
    lookup: &[LookupItem],
    width: usize,
    color: bool,
) {
    let value = display_value(&field.value, lookup);
    let _ = writeln!(out, "{indent}{:<width$}  {value}", format!("{}:", field.label));
    for error in &field.errors {
        if color {
            let _ = writeln!(out, "{indent}  {} {}", "!".red(), error.red());
        } else {
            let _ = writeln!(out, "{indent}  ! {error}");
        }
    }
}

/// Resolve reference values to their lookup label.
fn display_value(value: &FieldValue, lookup: &[LookupItem]) -> String {
    match value {
        FieldValue::Empty => "-".into(),
        FieldValue::Ref(id) => lookup
            .iter()
            .find(|item| item.id == Some(*id))
            .map_or_else(|| id.to_string(), |item| format!("{} ({id})", item.display_label)),
        FieldValue::Text(text) if text.is_empty() => "-".into(),
        FieldValue::Text(text) => text.clone(),
    }
}

/// `target: message` lines for a workspace's validation errors.
pub fn error_lines(view: &WorkspaceView) -> String {
    view.errors()
        .into_iter()
        .map(|(target, message)| format!("{target}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}
