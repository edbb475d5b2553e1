//! Output formatting for reconciled diff coverage.

use std::fmt::Write;

use crate::model::AggregateReport;

const EMPTY_MESSAGE: &str = "No coverage data found for added lines.\n";

/// Trait for formatting an aggregate report.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &AggregateReport) -> String;
}

/// Plain text table: one row per file, then a `Total` row.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &AggregateReport) -> String {
        if report.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }

        let width = report
            .files
            .keys()
            .map(|p| p.chars().count())
            .chain(std::iter::once("Total".len()))
            .max()
            .unwrap_or_default();

        let mut out = String::new();
        for file in report.files.values() {
            let path = &file.path;
            let covered = file.covered();
            let total = file.total();
            let pct = format_percentage(file.percentage());
            writeln!(out, "{path:>width$}\t{covered}/{total} - {pct}%").unwrap();
        }

        let covered = report.covered();
        let total = report.total();
        let pct = format_percentage(report.percentage());
        writeln!(out, "{:>width$}\t{covered}/{total} - {pct}%", "Total").unwrap();

        out
    }
}

/// Markdown summary suitable for a pull request or release note.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &AggregateReport) -> String {
        if report.is_empty() {
            return EMPTY_MESSAGE.to_string();
        }

        let mut md = String::new();

        let pct = format_percentage(report.percentage());
        writeln!(md, "### Diff Coverage: {pct}%\n").unwrap();

        let covered = report.covered();
        let total = report.total();
        writeln!(md, "**{covered}** of **{total}** added lines covered\n").unwrap();

        md.push_str("| File | Covered | Added | Coverage |\n");
        md.push_str("|:-----|--------:|------:|---------:|\n");
        for file in report.files.values() {
            let path = &file.path;
            let covered = file.covered();
            let total = file.total();
            let pct = format_percentage(file.percentage());
            writeln!(md, "| `{path}` | {covered} | {total} | {pct}% |").unwrap();
        }

        let with_misses: Vec<_> = report
            .files
            .values()
            .filter(|f| f.covered() < f.total())
            .collect();

        if with_misses.is_empty() {
            md.push_str("\nAll added lines are covered! 🎉\n");
        } else {
            md.push_str("\n<details>\n<summary>Uncovered lines</summary>\n\n");
            for f in &with_misses {
                let path = &f.path;
                let ranges = format_line_ranges(&f.uncovered_lines());
                writeln!(md, "**`{path}`**: {ranges}\n").unwrap();
            }
            md.push_str("</details>\n");
        }

        md
    }
}

/// Render an already-rounded percentage with at least one decimal place,
/// e.g. `100.0`, `50.5`, `66.67`.
#[must_use]
pub fn format_percentage(pct: f64) -> String {
    if pct.fract() == 0.0 {
        format!("{pct:.1}")
    } else {
        format!("{pct}")
    }
}

/// Coalesce sorted line numbers into `(start, end)` ranges of consecutive
/// lines.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = first;
    let mut end = first;

    for &line in rest {
        if end.checked_add(1) == Some(line) {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
///
/// The input slice must be sorted in ascending order.
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
