//! CSV sinks and console summaries for both run modes.
//!
//! Duplicate CSV columns: `checksum, size, count, paths` with member paths
//! sorted and joined by `|`.
//!
//! Comparison CSV columns: `file_name, exist_in_folder_1, exist_in_folder_2,
//! size_same, content_same` (`checksum_same` when digests were compared).
//! Booleans are written as `True`/`False`; an undetermined answer is an
//! empty cell.

use std::fs::File;
use std::io;
use std::path::Path;

use console::style;
use serde::Serialize;

use crate::comparator::CompareMode;
use crate::compare::ComparisonReport;
use crate::duplicates::DuplicateReport;
use crate::error::ReportError;
use crate::utils::{calculate_percentage, format_file_size};
use crate::Tristate;

pub const PATH_DELIMITER: &str = "|";

#[derive(Debug, Serialize)]
struct DuplicateRow {
    checksum: String,
    size: u64,
    count: usize,
    paths: String,
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn tristate_cell(value: Tristate) -> &'static str {
    value.as_option().map_or("", bool_cell)
}

/// Write one row per duplicate group, largest files first.
pub fn write_duplicates_csv<W: io::Write>(
    report: &DuplicateReport,
    writer: W,
) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if report.groups.is_empty() {
        csv_writer.write_record(["checksum", "size", "count", "paths"])?;
    }

    for group in &report.groups {
        let paths: Vec<String> = group
            .members()
            .iter()
            .map(|m| m.path().to_string_lossy().into_owned())
            .collect();

        csv_writer.serialize(DuplicateRow {
            checksum: group.digest().to_hex(),
            size: group.size(),
            count: group.count(),
            paths: paths.join(PATH_DELIMITER),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write one row per comparison outcome, in relative-key order.
pub fn write_comparison_csv<W: io::Write>(
    report: &ComparisonReport,
    mode: CompareMode,
    writer: W,
) -> Result<(), ReportError> {
    let content_column = match mode {
        CompareMode::Bytes => "content_same",
        CompareMode::Digest => "checksum_same",
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "file_name",
        "exist_in_folder_1",
        "exist_in_folder_2",
        "size_same",
        content_column,
    ])?;

    for outcome in &report.outcomes {
        csv_writer.write_record([
            outcome.relative(),
            bool_cell(outcome.in_a()),
            bool_cell(outcome.in_b()),
            tristate_cell(outcome.size_equal()),
            tristate_cell(outcome.content_equal()),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the duplicate report to it.
pub fn save_duplicates(report: &DuplicateReport, path: &Path) -> Result<(), ReportError> {
    write_duplicates_csv(report, File::create(path)?)
}

pub fn save_comparison(
    report: &ComparisonReport,
    mode: CompareMode,
    path: &Path,
) -> Result<(), ReportError> {
    write_comparison_csv(report, mode, File::create(path)?)
}

/// Print the duplicate summary to stdout.
pub fn print_duplicate_summary(report: &DuplicateReport) -> io::Result<()> {
    write_duplicate_summary(report, &mut io::stdout().lock())
}

pub fn write_duplicate_summary<W: io::Write>(
    report: &DuplicateReport,
    out: &mut W,
) -> io::Result<()> {
    if report.is_empty() {
        writeln!(
            out,
            "{}",
            style("✅ No potential duplicates found.").green().bold()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", style("📈 Summary").green().bold())?;
    writeln!(out, "{}", style("-".repeat(20)).green())?;
    writeln!(out, "  Total files scanned: {}", report.total_files)?;
    writeln!(
        out,
        "  Unique by size:      {} ({:.1}%)",
        report.unique_by_size,
        calculate_percentage(report.unique_by_size as u64, report.considered as u64)
    )?;
    writeln!(out, "  Files checksummed:   {}", report.candidates)?;
    writeln!(out, "  Duplicate groups:    {}", report.groups.len())?;
    writeln!(out, "  Files in duplicates: {}", report.files_in_groups())?;
    writeln!(
        out,
        "  Wasted space:        {}",
        style(format_file_size(report.wasted_space())).yellow().bold()
    )?;
    if report.errors > 0 {
        writeln!(
            out,
            "  {}",
            style(format!("Unreadable files:    {}", report.errors)).red()
        )?;
    }
    Ok(())
}

/// Print the comparison summary to stdout.
pub fn print_comparison_summary(report: &ComparisonReport) -> io::Result<()> {
    write_comparison_summary(report, &mut io::stdout().lock())
}

pub fn write_comparison_summary<W: io::Write>(
    report: &ComparisonReport,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style("📈 Summary").green().bold())?;
    writeln!(out, "{}", style("-".repeat(20)).green())?;
    writeln!(out, "  Folder 1 files:   {}", report.files_a)?;
    writeln!(out, "  Folder 2 files:   {}", report.files_b)?;
    writeln!(out, "  Only in folder 1: {}", report.only_in_a)?;
    writeln!(out, "  Only in folder 2: {}", report.only_in_b)?;
    writeln!(out, "  In both folders:  {}", report.common)?;
    writeln!(out, "    - Content compared:  {}", report.content_checks)?;
    writeln!(out, "    - Same content:      {}", style(report.same_content).green())?;
    writeln!(out, "    - Different content: {}", style(report.different_content).yellow())?;
    writeln!(out, "    - Different size:    {}", style(report.size_mismatches).yellow())?;
    if report.unknown_content > 0 {
        writeln!(out, "    - Unreadable:        {}", style(report.unknown_content).red())?;
    }
    Ok(())
}
