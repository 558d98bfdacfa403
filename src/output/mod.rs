//! Output formatting for sysdump

use crate::sysdump::RunSummary;
use owo_colors::OwoColorize;

/// Format a finished run for the terminal: totals, then a table of failed tasks
pub fn format_summary(summary: &RunSummary) -> String {
    let mut output = String::new();

    let errors = summary.failures.len();
    let status = if errors == 0 {
        "completed".green().to_string()
    } else {
        "completed with failures".yellow().to_string()
    };
    output.push_str(&format!(
        "Sysdump {} in {}\n",
        status,
        summary.output_dir.display().bold()
    ));
    output.push_str(&format!(
        "{} tasks: {} succeeded, {} failed, {} skipped\n",
        summary.total,
        summary.succeeded.green(),
        colorize_count(summary.failed),
        summary.skipped
    ));

    if errors > 0 {
        output.push_str(&format!("{} errors recorded\n", colorize_count(errors)));
        let rows: Vec<Vec<String>> = summary
            .failures
            .iter()
            .map(|f| vec![f.description.clone(), f.error.red().to_string()])
            .collect();
        output.push('\n');
        output.push_str(&format_table_raw(&["TASK", "ERROR"], &rows));
        output.push('\n');
    }

    output
}

fn colorize_count(count: usize) -> String {
    if count == 0 {
        count.to_string()
    } else {
        count.red().to_string()
    }
}

/// Format raw headers and rows as a table, sizing columns by visible width
pub fn format_table_raw(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_len(cell));
        }
    }

    let mut lines = vec![render_row(headers.iter().copied(), &widths)
        .bold()
        .to_string()];
    lines.extend(
        rows.iter()
            .map(|row| render_row(row.iter().map(String::as_str), &widths)),
    );
    lines.join("\n")
}

/// Cells padded to their column width, two spaces apart; cells past the last header are dropped
fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (cell, width) in cells.zip(widths) {
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(visible_len(cell)) + 2));
    }
    line.trim_end().to_string()
}

fn visible_len(s: &str) -> usize {
    strip_ansi_codes(s).chars().count()
}

/// Remove the SGR color sequences owo-colors emits
pub fn strip_ansi_codes(s: &str) -> String {
    let mut plain = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            plain.push(c);
            continue;
        }
        for end in chars.by_ref() {
            if end == 'm' {
                break;
            }
        }
    }
    plain
}
