// Result artifact — one sheet, one row per compared pair.
//
// The default artifact is an .xlsx workbook written with rust_xlsxwriter.
// A .csv path writes the same columns as plain CSV. `read_report` loads
// either format back into ComparisonResults.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::matching::ComparisonResult;

/// Worksheet name of the result artifact.
pub const SHEET_NAME: &str = "ComparisonResults";

/// Default file name offered for the artifact.
pub const DEFAULT_OUTPUT: &str = "comparison_results.xlsx";

/// Marker written in the Flag column for weak matches.
pub const FLAG_MARKER: &str = "🔴";

/// Header row, in output order.
pub const COLUMNS: [&str; 6] = [
    "Sheet1_ID",
    "Sheet2_ID",
    "Sheet1_Comment",
    "Sheet2_Comment",
    "Similarity (%)",
    "Flag",
];

/// Render results into an in-memory .xlsx workbook.
pub fn build_workbook(results: &[ComparisonResult]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(SHEET_NAME)
        .context("Unable to name the results worksheet")?;

    let header_format = Format::new().set_bold();
    for (col, header) in COLUMNS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .context("Unable to write the header row")?;
    }
    sheet.set_column_width(2, 40).context("Unable to size comment column")?;
    sheet.set_column_width(3, 40).context("Unable to size comment column")?;

    for (index, result) in results.iter().enumerate() {
        let row = (index + 1) as u32;
        sheet
            .write_number(row, 0, result.id_a as f64)
            .context("Unable to write Sheet1_ID")?;
        sheet
            .write_number(row, 1, result.id_b as f64)
            .context("Unable to write Sheet2_ID")?;
        sheet
            .write_string(row, 2, &result.text_a)
            .context("Unable to write Sheet1_Comment")?;
        sheet
            .write_string(row, 3, &result.text_b)
            .context("Unable to write Sheet2_Comment")?;
        sheet
            .write_number(row, 4, result.score as f64)
            .context("Unable to write the similarity score")?;
        if result.flagged {
            sheet
                .write_string(row, 5, FLAG_MARKER)
                .context("Unable to write the flag")?;
        }
    }

    workbook
        .save_to_buffer()
        .context("Unable to finalize the results workbook")
}

/// Write results to `path`. A `.csv` extension writes CSV; anything else
/// writes an .xlsx workbook.
pub fn write_report(results: &[ComparisonResult], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    if is_csv(path) {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(COLUMNS)?;
        for result in results {
            writer.write_record([
                result.id_a.to_string(),
                result.id_b.to_string(),
                result.text_a.clone(),
                result.text_b.clone(),
                result.score.to_string(),
                flag_text(result.flagged).to_string(),
            ])?;
        }
        writer.flush()?;
    } else {
        let bytes = build_workbook(results)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    info!(path = %path.display(), rows = results.len(), "Results written");
    Ok(())
}

/// Read an artifact produced by `write_report` back into results.
pub fn read_report(path: &Path) -> Result<Vec<ComparisonResult>> {
    let rows: Vec<Vec<String>> = if is_csv(path) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(str::to_string).collect()))
            .collect::<Result<_, _>>()
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let range = workbook
            .worksheet_range(SHEET_NAME)
            .with_context(|| format!("{} has no {SHEET_NAME} sheet", path.display()))?;
        range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    };

    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    for (i, expected) in COLUMNS.iter().enumerate() {
        let found = header.get(i).map(String::as_str).unwrap_or("");
        if found != *expected {
            anyhow::bail!(
                "{}: column {} is '{}', expected '{}'",
                path.display(),
                i + 1,
                found,
                expected
            );
        }
    }

    rows.enumerate()
        .map(|(i, row)| parse_row(&row).with_context(|| format!("Bad result row {}", i + 2)))
        .collect()
}

fn parse_row(row: &[String]) -> Result<ComparisonResult> {
    let field = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
    let id_a: usize = field(0).parse().context("Sheet1_ID is not an integer")?;
    let id_b: usize = field(1).parse().context("Sheet2_ID is not an integer")?;
    let score: u64 = field(4).parse().context("Similarity (%) is not an integer")?;
    Ok(ComparisonResult {
        id_a,
        id_b,
        text_a: field(2).to_string(),
        text_b: field(3).to_string(),
        score,
        flagged: !field(5).is_empty(),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        // Whole numbers come back from the workbook as floats
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Flag column text for a result.
pub fn flag_text(flagged: bool) -> &'static str {
    if flagged {
        FLAG_MARKER
    } else {
        ""
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
