// ==========================================
// Schedule Import - row parsing
// ==========================================
// Delimited text -> header labels + lazy RawRow stream.
// Spreadsheet grids (already tabular) -> same shape.
// ==========================================

use crate::domain::RawRow;
use crate::importer::error::{PipelineError, PipelineResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// Unwrap a cell wholly wrapped in matching single or double quotes
pub fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

fn build_row(row_number: usize, headers: &[String], cells: &[&str]) -> RawRow {
    let mut map = HashMap::with_capacity(headers.len());
    for (idx, value) in cells.iter().enumerate() {
        if let Some(header) = headers.get(idx) {
            // duplicate labels: first column wins
            map.entry(header.clone())
                .or_insert_with(|| strip_quotes(value).to_string());
        }
    }
    RawRow {
        row_number,
        cells: map,
    }
}

// ==========================================
// RowStream - lazy, finite, single-pass
// ==========================================
pub struct RowStream {
    inner: StreamSource,
    headers: Vec<String>,
}

enum StreamSource {
    Text(StringRecordsIntoIter<Cursor<Vec<u8>>>),
    Grid(std::iter::Enumerate<std::vec::IntoIter<Vec<String>>>),
}

/// Header labels plus the data rows that follow them
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: RowStream,
}

impl ParsedTable {
    fn new(headers: Vec<String>, inner: StreamSource) -> Self {
        Self {
            rows: RowStream {
                inner,
                headers: headers.clone(),
            },
            headers,
        }
    }
}

impl Iterator for RowStream {
    type Item = PipelineResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match &mut self.inner {
                StreamSource::Text(records) => {
                    let record: StringRecord = match records.next()? {
                        Ok(r) => r,
                        Err(e) => return Some(Err(PipelineError::from(e))),
                    };
                    let line = record
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or_default();
                    let cells: Vec<&str> = record.iter().collect();
                    build_row(line, &self.headers, &cells)
                }
                StreamSource::Grid(rows) => {
                    let (idx, cells) = rows.next()?;
                    let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
                    // header occupies row 1, data starts at row 2
                    build_row(idx + 2, &self.headers, &cells)
                }
            };

            // wholly blank rows are skipped
            if row.is_blank() {
                continue;
            }
            return Some(Ok(row));
        }
    }
}

// ==========================================
// RowParser
// ==========================================
pub struct RowParser {
    delimiter: u8,
    header_override: Option<Vec<String>>,
}

impl RowParser {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            header_override: None,
        }
    }

    /// Use explicit labels; every line of the input is then data
    pub fn with_headers(mut self, headers: Option<Vec<String>>) -> Self {
        self.header_override = headers.filter(|h| !h.is_empty());
        self
    }

    /// Tokenize decoded text
    pub fn parse(&self, text: &str) -> PipelineResult<ParsedTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(Cursor::new(text.as_bytes().to_vec()));

        let headers = match &self.header_override {
            Some(labels) => labels.iter().map(|h| strip_quotes(h).to_string()).collect(),
            None => {
                let mut first = StringRecord::new();
                if !reader.read_record(&mut first)? {
                    return Err(PipelineError::MissingHeader);
                }
                first
                    .iter()
                    .map(|h| strip_quotes(h.trim_start_matches('\u{feff}')).to_string())
                    .collect()
            }
        };

        Ok(ParsedTable::new(
            headers,
            StreamSource::Text(reader.into_records()),
        ))
    }

    /// Accept an already-tabular grid; first row is the header
    pub fn parse_grid(grid: Vec<Vec<String>>) -> PipelineResult<ParsedTable> {
        let mut rows = grid.into_iter();
        let headers: Vec<String> = rows
            .next()
            .ok_or(PipelineError::MissingHeader)?
            .iter()
            .map(|h| strip_quotes(h).to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(PipelineError::MissingHeader);
        }

        Ok(ParsedTable::new(headers, StreamSource::Grid(rows.enumerate())))
    }
}

// ==========================================
// Workbook loading (first worksheet)
// ==========================================

/// Read the first worksheet of an .xlsx/.xls/.ods workbook into a string grid
pub fn load_workbook_grid(path: &Path) -> PipelineResult<Vec<Vec<String>>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.display().to_string()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::SpreadsheetParseError("workbook has no sheets".to_string()))?;

    let range = workbook.worksheet_range(&first)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Cell as text; time-formatted cells become `HH:MM`
///
/// Excel stores times as day fractions (09:00 = 0.375), so the raw
/// value is never written out for date/time cells.
pub fn cell_text(cell: &Data) -> String {
    let hhmm = |cell: &Data| cell.as_time().map(|t| t.format("%H:%M").to_string());

    let text = match cell {
        Data::DateTime(dt) if dt.as_f64() < 1.0 => hhmm(cell),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string()),
        Data::DateTimeIso(raw) if !raw.contains('-') => hhmm(cell),
        Data::DurationIso(_) => hhmm(cell),
        _ => None,
    };

    text.unwrap_or_else(|| cell.to_string().trim().to_string())
}
