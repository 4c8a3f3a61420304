//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use spinfi_core::OutcomeKind;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint a spin-result headline by outcome kind.
pub fn paint_outcome(text: &str, kind: OutcomeKind, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match kind {
        OutcomeKind::Win => text.green().bold().to_string(),
        OutcomeKind::Bonus => text.yellow().bold().to_string(),
        OutcomeKind::Thanks => text.cyan().to_string(),
        OutcomeKind::Error => text.red().bold().to_string(),
    }
}

/// Green "yes" / dimmed "no".
pub fn paint_flag(value: bool, color: bool) -> String {
    let text = if value { "yes" } else { "no" };
    match (color, value) {
        (false, _) => text.to_owned(),
        (true, true) => text.green().to_string(),
        (true, false) => text.dimmed().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize, Tabled)]
    struct Row {
        name: String,
        weight: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "Thanks".into(),
                weight: 60,
            },
            Row {
                name: "1GB".into(),
                weight: 5,
            },
        ]
    }

    fn clone_row(r: &Row) -> Row {
        Row {
            name: r.name.clone(),
            weight: r.weight,
        }
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let out = render_list(&OutputFormat::Plain, &rows(), clone_row, |r| r.name.clone());
        assert_eq!(out, "Thanks\n1GB");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(&OutputFormat::JsonCompact, &rows(), clone_row, |r| {
            r.name.clone()
        });
        assert_eq!(
            out,
            r#"[{"name":"Thanks","weight":60},{"name":"1GB","weight":5}]"#
        );
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(&OutputFormat::Table, &rows(), clone_row, |r| r.name.clone());
        assert!(out.contains("name"));
        assert!(out.contains("weight"));
        assert!(out.contains("Thanks"));
    }

    #[test]
    fn uncolored_outcome_is_untouched() {
        assert_eq!(paint_outcome("Amazing!", OutcomeKind::Win, false), "Amazing!");
        assert_eq!(paint_flag(true, false), "yes");
    }
}
