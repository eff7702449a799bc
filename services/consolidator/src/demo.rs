//! Built-in demo sheet: ten agents shaped like a real KPI export.

use crate::value::{CellValue, RawRow, Sheets};

pub const DEMO_SHEET: &str = "DemoSheet";

const HEADERS: [&str; 16] = [
    "ID_empl",
    "Nombre",
    "TM",
    "Adherencia al puesto %",
    "NCO BO",
    "NCO Llam",
    "AHT",
    "Gest/H",
    "Cerr/H",
    "Tipificación",
    "Transfer",
    "NPS",
    "NCP",
    "gestTotal",
    "cerrTotal",
    "calls",
];

type DemoRow = (&'static str, &'static str, &'static str, [Option<f64>; 13]);

// adherence, ncoBO, ncoLlam, aht, gest/h, cerr/h, tipif, transfer, nps, ncp,
// gestTotal, cerrTotal, calls
const ROWS: [DemoRow; 10] = [
    ("41H198", "MARTINEZ ALONSO", "N/A", [Some(0.95), Some(88.0), Some(92.0), Some(280.0), Some(3.1), Some(2.2), Some(0.98), Some(0.05), Some(40.0), Some(9.5), Some(465.0), Some(330.0), Some(120.0)]),
    ("41J999", "PEREZ GARCIA", "TEAM A", [Some(0.88), Some(75.0), Some(80.0), Some(350.0), Some(2.5), Some(1.8), Some(92.0), Some(12.0), Some(20.0), Some(8.0), Some(375.0), Some(270.0), Some(150.0)]),
    ("41K123", "LOPEZ SANCHEZ", "TEAM B", [Some(1.0), Some(60.0), Some(65.0), Some(410.0), Some(2.0), Some(1.2), Some(85.0), Some(20.0), Some(10.0), Some(6.5), Some(300.0), Some(180.0), Some(200.0)]),
    // no data at all: every KPI cell is "-"
    ("41L456", "GOMEZ RUIZ", "TEAM A", [None; 13]),
    ("41M789", "FERNANDEZ DIAZ", "TEAM C", [Some(0.98), Some(95.0), Some(98.0), Some(250.0), Some(3.5), Some(2.8), Some(1.0), Some(2.0), Some(60.0), Some(10.0), Some(525.0), Some(420.0), Some(100.0)]),
    ("41N101", "RODRIGUEZ JIMENEZ", "TEAM B", [Some(0.65), Some(70.0), Some(70.0), Some(380.0), Some(2.2), Some(1.5), Some(75.0), Some(18.0), Some(15.0), Some(7.5), Some(330.0), Some(225.0), Some(180.0)]),
    ("41O202", "GARCIA PEREZ", "TEAM A", [Some(0.82), Some(80.0), Some(85.0), Some(310.0), Some(2.8), Some(2.0), Some(95.0), Some(8.0), Some(35.0), Some(8.8), Some(420.0), Some(300.0), Some(130.0)]),
    ("41P303", "SANCHEZ LOPEZ", "TEAM C", [Some(0.91), Some(88.0), Some(94.0), Some(290.0), Some(3.0), Some(2.4), Some(97.0), Some(4.0), Some(45.0), Some(9.2), Some(450.0), Some(360.0), Some(110.0)]),
    ("41Q404", "DIAZ FERNANDEZ", "TEAM B", [Some(0.55), Some(50.0), Some(55.0), Some(450.0), Some(1.7), Some(0.8), Some(65.0), Some(22.0), Some(0.0), Some(5.5), Some(255.0), Some(120.0), Some(220.0)]),
    ("41R505", "JIMENEZ RODRIGUEZ", "TEAM A", [Some(78.0), Some(75.0), Some(78.0), Some(330.0), Some(2.6), Some(1.9), Some(88.0), Some(10.0), Some(25.0), Some(8.2), Some(390.0), Some(285.0), Some(140.0)]),
];

fn demo_row((id, name, tm, values): &DemoRow) -> RawRow {
    let mut row = RawRow::new();
    row.insert(HEADERS[0].to_string(), CellValue::from(*id));
    row.insert(HEADERS[1].to_string(), CellValue::from(*name));
    row.insert(HEADERS[2].to_string(), CellValue::from(*tm));
    for (header, value) in HEADERS[3..].iter().zip(values) {
        let cell = value.map(CellValue::Number).unwrap_or_else(|| CellValue::from("-"));
        row.insert(header.to_string(), cell);
    }
    row
}

/// The demo data as a single sheet, ready for `merge`.
pub fn demo_sheets() -> Sheets {
    let mut sheets = Sheets::new();
    sheets.insert(DEMO_SHEET.to_string(), ROWS.iter().map(demo_row).collect());
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::merge;
    use crate::model::KpiKey;

    #[test]
    fn test_demo_merges_to_ten_agents() {
        let agents = merge(&demo_sheets());
        assert_eq!(agents.len(), 10);
        assert!(agents.iter().all(|a| a.history.len() == 1));

        let first = &agents[0];
        assert_eq!(first.id.as_deref(), Some("41H198"));
        assert_eq!(first.kpis.get(KpiKey::Adherence), Some(95.0));
        assert_eq!(first.kpis.get(KpiKey::Transfer), Some(5.0));
        assert_eq!(first.kpis.get(KpiKey::GestH), Some(3.1));

        let empty = agents.iter().find(|a| a.agent == "GOMEZ RUIZ").unwrap();
        assert!(!empty.kpis.has_any());
        assert_eq!(empty.supervisor, "TEAM A");
    }
}
