// Tabular input — load a worksheet or delimited file into an ordered Dataset.
//
// Excel-family workbooks are read with calamine (first worksheet only);
// .csv and tab-delimited .tsv/.txt go through the csv crate. Both paths end in
// the same header + rows shape, and the `Comment` column is located there.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::PreconditionError;

/// Header that must be present in every input, matched case-sensitively.
pub const COMMENT_COLUMN: &str = "Comment";

/// Text a missing cell becomes. The comparison treats it like any other
/// comment and hands it to the oracle verbatim.
pub const MISSING_COMMENT: &str = "nan";

/// One data row of an input sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Zero-based position among the data rows (header excluded).
    pub id: usize,
    pub comment: String,
}

/// An ordered sequence of records from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Display name, usually the file name.
    pub name: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Workbook,
    Delimited(u8),
}

impl Dataset {
    /// Build a dataset directly from comment strings, ids assigned in order.
    pub fn from_comments<I, S>(name: &str, comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = comments
            .into_iter()
            .enumerate()
            .map(|(id, comment)| Record {
                id,
                comment: comment.into(),
            })
            .collect();
        Self {
            name: name.to_string(),
            records,
        }
    }

    /// Load a dataset from a file on disk, choosing the reader by extension.
    pub fn from_path(path: &Path) -> Result<Self, PreconditionError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (headers, rows) = match detect_format(&name)? {
            Format::Workbook => {
                let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(&name, e))?;
                let sheet = first_sheet_name(&workbook.sheet_names(), &name)?;
                let range = workbook
                    .worksheet_range(&sheet)
                    .map_err(|e| unreadable(&name, e))?;
                split_range(&range, &name)?
            }
            Format::Delimited(delimiter) => {
                let reader = csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(true)
                    .flexible(true)
                    .from_path(path)
                    .map_err(|e| unreadable(&name, e))?;
                read_delimited(reader, &name)?
            }
        };

        Self::from_table(name, headers, rows)
    }

    /// Load a dataset from uploaded bytes. `name` supplies the extension.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self, PreconditionError> {
        let (headers, rows) = match detect_format(name)? {
            Format::Workbook => {
                let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
                    .map_err(|e| unreadable(name, e))?;
                let sheet = first_sheet_name(&workbook.sheet_names(), name)?;
                let range = workbook
                    .worksheet_range(&sheet)
                    .map_err(|e| unreadable(name, e))?;
                split_range(&range, name)?
            }
            Format::Delimited(delimiter) => {
                let reader = csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(true)
                    .flexible(true)
                    .from_reader(Cursor::new(bytes));
                read_delimited(reader, name)?
            }
        };

        Self::from_table(name.to_string(), headers, rows)
    }

    /// Pick the `Comment` column out of a header row and data rows.
    ///
    /// Cells are `None` when missing; those become `MISSING_COMMENT`.
    /// Rows with no content in any column are skipped and do not get an id.
    fn from_table(
        name: String,
        headers: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, PreconditionError> {
        let column = headers
            .iter()
            .position(|h| h == COMMENT_COLUMN)
            .ok_or_else(|| PreconditionError::MissingColumn {
                source_name: name.clone(),
                column: COMMENT_COLUMN,
            })?;

        let records: Vec<Record> = rows
            .into_iter()
            .filter(|row| row.iter().any(Option::is_some))
            .enumerate()
            .map(|(id, mut row)| {
                let comment = row
                    .get_mut(column)
                    .and_then(Option::take)
                    .unwrap_or_else(|| MISSING_COMMENT.to_string());
                Record { id, comment }
            })
            .collect();

        debug!(dataset = %name, records = records.len(), "Loaded dataset");

        Ok(Self { name, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn detect_format(name: &str) -> Result<Format, PreconditionError> {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Format::Workbook),
        "csv" => Ok(Format::Delimited(b',')),
        "tsv" | "txt" => Ok(Format::Delimited(b'\t')),
        _ => Err(PreconditionError::UnsupportedFormat(name.to_string())),
    }
}

fn first_sheet_name(names: &[String], source: &str) -> Result<String, PreconditionError> {
    names
        .first()
        .cloned()
        .ok_or_else(|| PreconditionError::NoWorksheet(source.to_string()))
}

fn unreadable(source: &str, err: impl std::fmt::Display) -> PreconditionError {
    PreconditionError::Unreadable {
        source_name: source.to_string(),
        message: err.to_string(),
    }
}

type Table = (Vec<String>, Vec<Vec<Option<String>>>);

fn split_range(range: &Range<Data>, source: &str) -> Result<Table, PreconditionError> {
    let mut rows_iter = range.rows();
    let header_row = rows_iter
        .next()
        .ok_or_else(|| PreconditionError::Empty(source.to_string()))?;

    let headers = header_row
        .iter()
        .map(|cell| cell_to_string(cell).unwrap_or_default())
        .collect();
    let rows = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok((headers, rows))
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        other => Some(other.to_string()),
    }
}

fn read_delimited<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    source: &str,
) -> Result<Table, PreconditionError> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unreadable(source, e))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(PreconditionError::Empty(source.to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(source, e))?;
        let values = record
            .iter()
            .map(|value| (!value.is_empty()).then(|| value.to_string()))
            .collect();
        rows.push(values);
    }

    Ok((headers, rows))
}
