//! Shared output formatting for load reports.
//!
//! Provides JSON and plain-text formatters for `LoadReport`. Colors are left
//! to the CLI layer.

use std::io::Write;

use crate::report::LoadReport;

/// Format a `LoadReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &LoadReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `LoadReport` as human-readable plain text to a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &LoadReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  SNI CONTENT LOADER")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Files scanned:  {}", report.scanned_files)?;
    writeln!(writer, "  Records loaded: {}", report.records_count())?;
    writeln!(writer, "  Files skipped:  {}", report.skipped.len())?;
    writeln!(writer)?;

    if !report.records.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  RECORDS")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for record in &report.records {
            let slug = record
                .get("slug")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            writeln!(writer, "  {slug}")?;
        }
        writeln!(writer)?;
    }

    if !report.skipped.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  SKIPPED FILES")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for skipped in &report.skipped {
            writeln!(writer, "  {}", skipped.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.is_complete() {
        writeln!(
            writer,
            "\u{2713} All {} files loaded",
            report.scanned_files
        )?;
    } else {
        writeln!(
            writer,
            "\u{2717} {} of {} file(s) skipped",
            report.skipped.len(),
            report.scanned_files
        )?;
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}
