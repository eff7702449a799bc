//! Cell values and the normalization rules applied to them.
//!
//! Every function here is total: unparseable input becomes `None` (numbers,
//! segments) or is handed back unchanged (dates). Nothing in this module
//! returns an error.

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A raw spreadsheet cell as the reader hands it over.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

/// One spreadsheet row: header -> cell, in sheet column order.
pub type RawRow = IndexMap<String, CellValue>;

/// Sheet label -> rows. Iteration order is processing order.
pub type Sheets = IndexMap<String, Vec<RawRow>>;

impl CellValue {
    /// `Empty`, or text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Render as trimmed text; `None` for blank cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

/// Whole numbers print without a trailing ".0" so numeric IDs stay stable.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// NUMBERS
// =============================================================================

/// Tokens spreadsheets use for "no value".
const NULL_TOKENS: &[&str] = &["-", "N/A", "#DIV/0!"];

/// Parse a numeric cell, accepting "85%" and comma decimals ("2,5").
pub fn parse_number(raw: &CellValue) -> Option<f64> {
    match raw {
        CellValue::Empty => None,
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed) {
                return None;
            }
            let cleaned = trimmed.replacen('%', "", 1).replacen(',', ".", 1);
            cleaned
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
        }
    }
}

/// Percent fields arrive either as fractions (0.85) or whole numbers (85).
///
/// Values strictly inside (-1, 1), zero excluded, are scaled to whole
/// percent and rounded to two decimals. `1` and `0` pass through.
pub fn normalize_percent(raw: &CellValue) -> Option<f64> {
    let num = parse_number(raw)?;
    if num > -1.0 && num < 1.0 && num != 0.0 {
        Some((num * 100.0 * 100.0).round() / 100.0)
    } else {
        Some(num)
    }
}

// =============================================================================
// DATES
// =============================================================================

/// Plausible serial range for recent-era Excel dates.
const EXCEL_SERIAL_MIN: f64 = 40_000.0;
const EXCEL_SERIAL_MAX: f64 = 55_000.0;

/// Serial of 1970-01-01 with the 1899-12-30 Excel epoch.
const UNIX_EPOCH_SERIAL: f64 = 25_569.0;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Render Excel serial dates as `DD/MM/YYYY`; anything else is returned as is.
pub fn parse_excel_date(raw: &CellValue) -> CellValue {
    let CellValue::Number(serial) = raw else {
        return raw.clone();
    };
    if !(EXCEL_SERIAL_MIN..EXCEL_SERIAL_MAX).contains(serial) {
        return raw.clone();
    }

    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY as f64).round() as i64;
    let days = millis.div_euclid(MILLIS_PER_DAY);

    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(days)))
        .map(|date| CellValue::Text(date.format("%d/%m/%Y").to_string()))
        .unwrap_or_else(|| raw.clone())
}

// =============================================================================
// SEGMENTS
// =============================================================================

/// Agent segment; the only categorical value the pipeline canonicalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Segment {
    Juridico,
    Estandar,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Juridico => "JURIDICO",
            Segment::Estandar => "ESTANDAR",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercase and drop combining diacritics ("Jurídico" -> "JURIDICO").
pub fn fold_accents_upper(s: &str) -> String {
    s.trim()
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Canonicalize a segment cell. `None` means "unknown here", so another
/// source is free to fill the field during merge.
pub fn parse_segment(raw: &CellValue) -> Option<Segment> {
    let text = raw.as_text()?;
    let folded = fold_accents_upper(&text);

    if folded.starts_with("AGENTE JURIDICO") || folded == "JURIDICO" || folded == "LEGAL" {
        return Some(Segment::Juridico);
    }
    if folded.starts_with("AGENTE ESTANDAR")
        || matches!(folded.as_str(), "ESTANDAR" | "STANDARD" | "STD")
    {
        return Some(Segment::Estandar);
    }
    if folded.contains("JURIDICO") && !folded.contains("NO ") {
        return Some(Segment::Juridico);
    }
    None
}
