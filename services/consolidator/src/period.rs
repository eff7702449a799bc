//! Reporting periods derived from sheet / file labels.
//!
//! A period is either a calendar month or, when nothing date-like can be
//! read from the label, the label itself. Unknown labels are never folded
//! into each other.

use std::cmp::Ordering;
use std::fmt;

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator used for batch labels: `"<filename>::<sheetname>"`.
pub const SHEET_SEPARATOR: &str = "::";

/// Year assumed for December aliases (W52, DIC, DEC) without a year.
const DECEMBER_ALIAS_YEAR: i32 = 2025;

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"20\d{2}").expect("static regex"));

// `KPI_2025_12.xlsx`, `2025-01`, `informe 2024.3`
static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(20\d{2})[-_ ./](1[0-2]|0?[1-9])(?:\D|$)").expect("static regex")
});

static MONTH_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").expect("static regex"));

/// Sortable reporting period.
///
/// Months order chronologically and always sort before fallback labels;
/// labels order by string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Period {
    Month { year: i32, month: u32 },
    Label(String),
}

impl Period {
    pub fn month(year: i32, month: u32) -> Self {
        Period::Month { year, month }
    }

    /// Parse a stored key: `YYYY-MM` becomes a month, anything else a label.
    pub fn from_key(key: &str) -> Self {
        MONTH_KEY_RE
            .captures(key)
            .and_then(|caps| {
                let year = caps[1].parse().ok()?;
                let month = caps[2].parse().ok()?;
                Some(Period::Month { year, month })
            })
            .unwrap_or_else(|| Period::Label(key.to_string()))
    }
}

impl Default for Period {
    fn default() -> Self {
        Period::Label(String::new())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            Period::Label(label) => f.write_str(label),
        }
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Period::Month { year: ya, month: ma }, Period::Month { year: yb, month: mb }) => {
                (ya, ma).cmp(&(yb, mb))
            }
            (Period::Month { .. }, Period::Label(_)) => Ordering::Less,
            (Period::Label(_), Period::Month { .. }) => Ordering::Greater,
            (Period::Label(a), Period::Label(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Period::from_key(&key))
    }
}

/// Derive the reporting period of a sheet or file label.
///
/// Order of attempts:
/// 1. a Spanish month name, with the first `20xx` in the label as year
///    (current year when absent);
/// 2. a numeric `YYYY<sep>MM` pair;
/// 3. December aliases `W52`, `DIC`, `DEC`, `DICIEMBRE` (year defaults to 2025);
/// 4. the label itself, cut at the first `::`.
///
/// The numeric pair is checked before the aliases because it states the
/// month outright, while the aliases are loose substrings: `KPI_2025_03_DEC.xlsx`
/// is March, and `Decisiones_2025_05.xlsx` must not become December.
pub fn extract_period(label: &str) -> Period {
    let lower = label.to_lowercase();
    let year = YEAR_RE
        .find(&lower)
        .and_then(|m| m.as_str().parse::<i32>().ok());

    if let Some(idx) = SPANISH_MONTHS.iter().position(|m| lower.contains(m)) {
        let year = year.unwrap_or_else(|| chrono::Utc::now().year());
        return Period::month(year, idx as u32 + 1);
    }

    if let Some(caps) = YEAR_MONTH_RE.captures(&lower) {
        if let (Ok(year), Ok(month)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) {
            return Period::month(year, month);
        }
    }

    let upper = label.to_uppercase();
    if ["W52", "DIC", "DEC", "DICIEMBRE"]
        .iter()
        .any(|alias| upper.contains(alias))
    {
        return Period::month(year.unwrap_or(DECEMBER_ALIAS_YEAR), 12);
    }

    let head = label.split(SHEET_SEPARATOR).next().unwrap_or_default();
    if head.is_empty() {
        Period::Label(label.to_string())
    } else {
        Period::Label(head.to_string())
    }
}
