//! Row normalization: one sheet of raw rows -> agent fragments.
//!
//! The column mapping is detected once from the first row's keys and reused
//! for every row of the sheet; sheets are assumed to have one header row.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::columns::{detect_columns, ColumnMapping, Field, IdentityField};
use crate::model::{
    Admin, AdminField, AdminKind, Fragment, KpiKey, Kpis, UNASSIGNED_SUPERVISOR, UNKNOWN_AGENT,
};
use crate::period::Period;
use crate::value::{
    normalize_percent, parse_excel_date, parse_number, parse_segment, CellValue, RawRow, Segment,
};

static EMPTY: CellValue = CellValue::Empty;

// Leading number the way spreadsheet formulas read it ("12abc" -> 12).
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("static regex")
});

/// Salesforce users are codes; anything below this reads as a score.
const SALESFORCE_MIN_NUMERIC_ID: f64 = 10_000.0;

/// Normalize every row of one sheet. Rows without ID and without name are
/// dropped. An empty sheet, or one whose first row has no keys, yields
/// nothing.
pub fn normalize(rows: &[RawRow]) -> Vec<Fragment> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    if first.is_empty() {
        return Vec::new();
    }

    let mapping = detect_columns(first.keys().map(String::as_str));
    tracing::debug!(
        detected = mapping.detected(),
        daily_columns = mapping.daily_control.len(),
        "column mapping built"
    );

    rows.iter()
        .filter_map(|row| normalize_row(row, &mapping))
        .collect()
}

fn cell<'a>(row: &'a RawRow, mapping: &ColumnMapping, field: Field) -> &'a CellValue {
    mapping
        .get(field)
        .and_then(|header| row.get(header))
        .unwrap_or(&EMPTY)
}

fn identity_text(row: &RawRow, mapping: &ColumnMapping, field: IdentityField) -> Option<String> {
    cell(row, mapping, Field::Identity(field)).as_text()
}

/// Normalize one row with a prebuilt mapping. `None` when the row has
/// neither an identifier nor a usable name.
pub fn normalize_row(row: &RawRow, mapping: &ColumnMapping) -> Option<Fragment> {
    let agent = identity_text(row, mapping, IdentityField::Name)
        .or_else(|| identity_text(row, mapping, IdentityField::Agent))
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string());

    let id = [IdentityField::Id, IdentityField::IdBoost, IdentityField::IdEmpl]
        .into_iter()
        .find_map(|field| identity_text(row, mapping, field));

    if agent == UNKNOWN_AGENT && id.is_none() {
        return None;
    }

    let supervisor = identity_text(row, mapping, IdentityField::Supervisor)
        .unwrap_or_else(|| UNASSIGNED_SUPERVISOR.to_string());

    Some(Fragment {
        kpis: normalize_kpis(row, mapping),
        admin: normalize_admin(row, mapping, &agent),
        agent,
        id,
        supervisor,
        source: String::new(),
        period: Period::default(),
    })
}

fn normalize_kpis(row: &RawRow, mapping: &ColumnMapping) -> Kpis {
    let mut kpis = Kpis::default();
    for key in KpiKey::ALL {
        let raw = cell(row, mapping, Field::Kpi(key));
        let value = if key.is_percent() {
            normalize_percent(raw)
        } else {
            parse_number(raw)
        };
        kpis.set(key, value);
    }
    kpis
}

fn normalize_admin(row: &RawRow, mapping: &ColumnMapping, agent: &str) -> Admin {
    let mut admin = Admin::default();

    for field in AdminField::ALL {
        let value = match field.kind() {
            AdminKind::Plain => Some(cell(row, mapping, Field::Admin(field)).clone()),
            AdminKind::ExcelDate => Some(parse_excel_date(cell(row, mapping, Field::Admin(field)))),
            AdminKind::Segment => resolve_segment(row, mapping)
                .map(|segment| CellValue::Text(segment.as_str().to_string())),
            AdminKind::Salesforce => resolve_salesforce(row, mapping, agent),
        };
        if let Some(value) = value.filter(|v| !v.is_blank()) {
            admin.fields.insert(field, value);
        }
    }

    for header in &mapping.daily_control {
        if let Some(code) = row.get(header).filter(|v| !v.is_blank()) {
            admin
                .daily_control
                .insert(header.trim().to_string(), code.clone());
        }
    }

    admin
}

/// Explicit segment column first, then a content scan of the candidates.
fn resolve_segment(row: &RawRow, mapping: &ColumnMapping) -> Option<Segment> {
    parse_segment(cell(row, mapping, Field::Admin(AdminField::Segment))).or_else(|| {
        mapping
            .segment_candidates
            .iter()
            .filter_map(|header| row.get(header))
            .find_map(parse_segment)
    })
}

/// First candidate whose value looks like a user code rather than a score,
/// a percentage or the agent's own name.
fn resolve_salesforce(row: &RawRow, mapping: &ColumnMapping, agent: &str) -> Option<CellValue> {
    mapping
        .salesforce_candidates
        .iter()
        .filter_map(|header| row.get(header))
        .find(|value| {
            let Some(text) = value.as_text() else {
                return false;
            };
            text.chars().count() > 2
                && !text.contains(' ')
                && text != agent
                && !looks_like_score(&text)
        })
        .cloned()
}

fn looks_like_score(text: &str) -> bool {
    LEADING_NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .is_some_and(|n| n < SALESFORCE_MIN_NUMERIC_ID || text.contains('.'))
}
