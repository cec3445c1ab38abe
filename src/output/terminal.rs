// Colored terminal output for comparison runs.
//
// main.rs delegates here for everything printed after a run: the summary
// counts, a preview table of results and any pairs that were scored 0.

use colored::Colorize;

use crate::matching::{ComparisonReport, ComparisonResult, FLAG_THRESHOLD};

use super::report::flag_text;
use super::truncate_chars;

/// Print headline counts for a finished run.
pub fn display_summary(report: &ComparisonReport) {
    let total = report.results.len();
    let flagged = report.flagged_count();

    println!(
        "\n{}",
        format!("=== Comparison Results ({total} pairs) ===").bold()
    );
    println!(
        "  {} matched (score >= {FLAG_THRESHOLD})",
        format!("{}", total - flagged).green()
    );
    println!(
        "  {} flagged (score < {FLAG_THRESHOLD})",
        format!("{flagged}").red()
    );
    if !report.warnings.is_empty() {
        println!(
            "  {} pairs scored 0 after an oracle or parse failure",
            format!("{}", report.warnings.len()).yellow()
        );
    }
}

/// Print up to `limit` result rows as a table.
pub fn display_results(results: &[ComparisonResult], limit: usize) {
    if results.is_empty() || limit == 0 {
        return;
    }

    println!();
    println!(
        "  {:>5} {:>5}  {:<36} {:<36} {:>5}  {}",
        "A".dimmed(),
        "B".dimmed(),
        "Sheet1 comment".dimmed(),
        "Sheet2 comment".dimmed(),
        "Sim%".dimmed(),
        "Flag".dimmed(),
    );
    println!("  {}", "-".repeat(96).dimmed());

    for result in results.iter().take(limit) {
        let score = format!("{:>5}", result.score);
        let score = if result.flagged {
            score.red()
        } else {
            score.green()
        };
        println!(
            "  {:>5} {:>5}  {:<36} {:<36} {}  {}",
            result.id_a,
            result.id_b,
            truncate_chars(&result.text_a, 33),
            truncate_chars(&result.text_b, 33),
            score,
            flag_text(result.flagged),
        );
    }

    if results.len() > limit {
        println!(
            "  {}",
            format!("... {} more rows in the report file", results.len() - limit).dimmed()
        );
    }
}

/// Print the pairs that fell back to a score of 0.
pub fn display_warnings(report: &ComparisonReport) {
    if report.warnings.is_empty() {
        return;
    }

    println!("\n{}", "Pairs scored 0:".yellow().bold());
    for warning in &report.warnings {
        println!(
            "  {} ({}, {}): {}",
            "Warning:".yellow(),
            warning.id_a,
            warning.id_b,
            truncate_chars(&warning.error.to_string(), 160),
        );
    }
}
