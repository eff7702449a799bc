//! Reading spreadsheet files into raw rows.
//!
//! Responsibilities:
//! - Open CSV (any common encoding / delimiter) and Excel-family workbooks
//! - Turn each sheet's first row into unique header names
//! - Hand every data row over as header -> cell, blank rows dropped
//! - Read batches sequentially, skipping duplicate files and recording
//!   per-file failures instead of aborting

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::columns::EMPTY_HEADER;
use crate::error::{ConsolidateError, ConsolidateResult};
use crate::period::SHEET_SEPARATOR;
use crate::value::{format_number, CellValue, RawRow, Sheets};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

// Plain decimal numbers. Leading zeros ("007") stay text so codes survive.
static CSV_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:0|[1-9]\d*)(?:\.\d+)?$").expect("static regex"));

// =============================================================================
// Single file
// =============================================================================

/// Read every sheet of one file. Sheet keys are bare sheet names (the file
/// stem for CSV).
pub async fn read_workbook(path: &Path) -> ConsolidateResult<Sheets> {
    let bytes = fs::read(path).await?;
    parse_workbook(path, &bytes)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Parse already-loaded file content; the path only selects the format and
/// names CSV sheets.
pub fn parse_workbook(path: &Path, bytes: &[u8]) -> ConsolidateResult<Sheets> {
    let extension = extension_of(path);
    let mut sheets = Sheets::new();

    if extension == "csv" {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();
        sheets.insert(name, parse_csv(bytes)?);
        return Ok(sheets);
    }

    if !WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConsolidateError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    }

    // calamine sniffs the actual container format from the bytes
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet_names = workbook.sheet_names().to_vec();

    for name in sheet_names {
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                let rows = build_rows(
                    range
                        .rows()
                        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>()),
                );
                tracing::debug!(sheet = %name, rows = rows.len(), "sheet read");
                sheets.insert(name, rows);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), sheet = %name, error = %e, "skipping unreadable sheet");
            }
        }
    }

    if sheets.is_empty() {
        return Err(ConsolidateError::NoSheets {
            path: path.to_path_buf(),
        });
    }
    Ok(sheets)
}

/// Spreadsheet cell -> raw cell. Dates keep their serial number so the
/// normalizer can decide how to render them.
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

// =============================================================================
// CSV
// =============================================================================

/// UTF-8 (BOM stripped) when valid, Windows-1252 otherwise.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Most frequent of `;`, `,` and tab on the first line; `,` by default.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    [b';', b'\t', b',']
        .into_iter()
        .map(|d| (d, first_line.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn csv_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if CSV_NUMBER_RE.is_match(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
    }
    CellValue::Text(trimmed.to_string())
}

fn parse_csv(bytes: &[u8]) -> ConsolidateResult<Vec<RawRow>> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(&text))
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(csv_cell).collect());
    }
    Ok(build_rows(records.into_iter()))
}

// =============================================================================
// Rows and headers
// =============================================================================

/// Header row -> unique names. Blank headers become `__EMPTY`,
/// `__EMPTY_1`, ...; repeated headers get `_1`, `_2`, ... suffixes.
pub fn header_names<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut used: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .map(|cell| {
            let base = match cell {
                CellValue::Number(n) => format_number(*n),
                other => other.as_text().unwrap_or_else(|| EMPTY_HEADER.to_string()),
            };
            let mut name = base.clone();
            while used.contains(&name) {
                let n = suffixes.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{base}_{n}");
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// First row is the header; every later non-blank row carries every header.
pub fn build_rows<I>(mut rows: I) -> Vec<RawRow>
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = header_names(&header_row);

    rows.filter(|cells| cells.iter().any(|c| !c.is_blank()))
        .map(|cells| {
            let mut cells = cells.into_iter();
            headers
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or_default()))
                .collect()
        })
        .collect()
}

// =============================================================================
// Batch
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub content_hash: String,
    pub sheets: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// What happened to each file of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub read: Vec<FileSummary>,
    pub duplicates: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn sheet_count(&self) -> usize {
        self.read.iter().map(|f| f.sheets).sum()
    }

    pub fn row_count(&self) -> usize {
        self.read.iter().map(|f| f.rows).sum()
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

fn batch_label(path: &Path, sheet: &str) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{file_name}{SHEET_SEPARATOR}{sheet}")
}

/// Read files one at a time, in order. A failing file is logged and
/// reported; the rest of the batch still runs.
pub async fn read_batch(paths: &[PathBuf]) -> (Sheets, BatchReport) {
    let mut sheets = Sheets::new();
    let mut report = BatchReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for path in paths {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read file");
                report.failures.push(FileFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let hash = content_hash(&bytes);
        if !seen.insert(hash.clone()) {
            tracing::info!(path = %path.display(), %hash, "duplicate file skipped");
            report.duplicates.push(path.clone());
            continue;
        }

        match parse_workbook(path, &bytes) {
            Ok(file_sheets) => {
                let summary = FileSummary {
                    path: path.clone(),
                    content_hash: hash,
                    sheets: file_sheets.len(),
                    rows: file_sheets.values().map(Vec::len).sum(),
                };
                tracing::info!(
                    path = %path.display(),
                    sheets = summary.sheets,
                    rows = summary.rows,
                    "file read"
                );
                for (sheet, rows) in file_sheets {
                    sheets.insert(batch_label(path, &sheet), rows);
                }
                report.read.push(summary);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse file");
                report.failures.push(FileFailure {
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    (sheets, report)
}
