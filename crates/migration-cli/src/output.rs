//! Output-artifact renderers: `console`, `sql`, `json`, `markdown`.
//! All four consume an already-built [`migration_core::Report`] plus the
//! synthesized script; only `console` is printed, the rest are written to
//! `<migration-name>.<ext>`.

use migration_core::DiffOutcome;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// `json` wraps the Report with an embedded copy of the SQL script under
/// `migrationScript`, via a thin wrapper rather than mutating `Report`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportWithScript<'a> {
    #[serde(flatten)]
    report: &'a migration_core::Report,
    migration_script: &'a str,
}

pub fn render_console(outcome: &DiffOutcome) -> String {
    let report = &outcome.report;
    let mut out = String::new();

    let _ = writeln!(out, "Schema diff for migration '{}' ({})", report.metadata.migration_name, report.metadata.engine);
    let _ = writeln!(
        out,
        "  {} difference(s) found across {} table(s) compared",
        report.summary.differences_found, report.summary.tables_compared
    );

    for table in &report.missing_tables {
        let _ = writeln!(out, "  - missing table: {} ({} column(s))", table.full_name, table.column_count);
    }
    for table in &report.extra_tables {
        let _ = writeln!(out, "  + extra table: {} ({} column(s))", table.full_name, table.column_count);
    }
    for table in &report.modified_tables {
        let _ = writeln!(out, "  ~ modified table: {}", table.table_name);
        for column in &table.missing_columns {
            let _ = writeln!(out, "      - missing column: {}", column);
        }
        for column in &table.extra_columns {
            let _ = writeln!(out, "      + extra column: {}", column);
        }
        for modification in &table.modified_columns {
            let _ = writeln!(out, "      ~ modified column: {}", modification.name);
            for difference in &modification.differences {
                let _ = writeln!(out, "          {}", difference);
            }
        }
    }

    out
}

pub fn write_sql(outcome: &DiffOutcome, migration_name: &str) -> std::io::Result<()> {
    std::fs::write(Path::new(migration_name).with_extension("sql"), &outcome.migration_script)
}

pub fn write_json(outcome: &DiffOutcome, migration_name: &str) -> std::io::Result<()> {
    let wrapped = ReportWithScript { report: &outcome.report, migration_script: &outcome.migration_script };
    let body = serde_json::to_string_pretty(&wrapped).expect("Report serialization cannot fail");
    std::fs::write(Path::new(migration_name).with_extension("json"), body)
}

pub fn write_markdown(outcome: &DiffOutcome, migration_name: &str) -> std::io::Result<()> {
    let report = &outcome.report;
    let mut out = String::new();

    let _ = writeln!(out, "# Schema diff: {}", report.metadata.migration_name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Engine: `{}`  ", report.metadata.engine);
    let _ = writeln!(out, "Generated: `{}`  ", report.metadata.generated_at.to_rfc3339());
    let _ = writeln!(out);
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Tables compared: {}", report.summary.tables_compared);
    let _ = writeln!(out, "- Differences found: {}", report.summary.differences_found);
    let _ = writeln!(out);

    if !report.missing_tables.is_empty() {
        let _ = writeln!(out, "## Missing tables");
        for table in &report.missing_tables {
            let _ = writeln!(out, "- `{}`", table.full_name);
        }
        let _ = writeln!(out);
    }

    if !report.extra_tables.is_empty() {
        let _ = writeln!(out, "## Extra tables");
        for table in &report.extra_tables {
            let _ = writeln!(out, "- `{}`", table.full_name);
        }
        let _ = writeln!(out);
    }

    if !report.modified_tables.is_empty() {
        let _ = writeln!(out, "## Modified tables");
        for table in &report.modified_tables {
            let _ = writeln!(out, "### `{}`", table.table_name);
            for modification in &table.modified_columns {
                let _ = writeln!(out, "- `{}`: {}", modification.name, modification.differences.join("; "));
            }
        }
    }

    std::fs::write(Path::new(migration_name).with_extension("md"), out)
}
