//! Identity resolution and consolidation of fragments into agents.
//!
//! `cluster` is a pure function over an ordered fragment stream: earlier
//! fragments seed clusters that later ones attach to, and the output keeps
//! cluster creation order. Identity is monotonic. Every cluster keeps the
//! tokens (trimmed, uppercased IDs and names) of the fragments it absorbed;
//! sets only grow and clusters are never fused or split. Two people who
//! share a transient token are therefore merged (false-merge risk), which
//! is logged but not corrected.

use std::collections::{BTreeSet, HashMap};

use crate::model::{
    is_usable_name, Agent, Fragment, HistoryEntry, UNASSIGNED_SUPERVISOR, UNKNOWN_AGENT,
};
use crate::period::Period;
use crate::rows::normalize;
use crate::value::{CellValue, Sheets};

/// Labels containing these markers come from operational KPI exports and
/// are preferred as provenance over admin/control files of the same month.
const AUTHORITATIVE_MARKERS: [&str; 2] = ["KPI", "RESULT"];

/// Canonical form used for identity matching.
pub fn identity_token(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// =============================================================================
// IDENTITY INDEX
// =============================================================================

/// Token -> every cluster holding it, for IDs and names separately.
///
/// This is the inverse of the per-cluster ID and name sets. A token can
/// end up in several clusters (a name absorbed by a cluster matched on its
/// ID while another cluster already holds that name); lookups resolve to
/// the earliest-created one.
#[derive(Debug, Default)]
pub struct IdentityIndex {
    by_id: HashMap<String, BTreeSet<usize>>,
    by_name: HashMap<String, BTreeSet<usize>>,
}

impl IdentityIndex {
    /// ID match first, name match second.
    pub fn find(&self, fragment: &Fragment) -> Option<usize> {
        let by_id = fragment
            .id
            .as_deref()
            .and_then(|id| earliest(&self.by_id, &identity_token(id)));
        let by_name = fragment
            .has_name()
            .then(|| earliest(&self.by_name, &identity_token(&fragment.agent)))
            .flatten();

        if let (Some(id_cluster), Some(name_cluster)) = (by_id, by_name) {
            if id_cluster != name_cluster {
                tracing::debug!(
                    agent = %fragment.agent,
                    id = ?fragment.id,
                    id_cluster,
                    name_cluster,
                    "identity conflict: ID and name point at different clusters, using ID"
                );
            }
        }

        by_id.or(by_name)
    }

    /// Add the fragment's tokens to `cluster`.
    pub fn register(&mut self, fragment: &Fragment, cluster: usize) {
        if let Some(id) = fragment.id.as_deref() {
            hold(&mut self.by_id, identity_token(id), cluster);
        }
        if fragment.has_name() {
            hold(&mut self.by_name, identity_token(&fragment.agent), cluster);
        }
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn earliest(tokens: &HashMap<String, BTreeSet<usize>>, token: &str) -> Option<usize> {
    tokens.get(token).and_then(|owners| owners.first().copied())
}

fn hold(tokens: &mut HashMap<String, BTreeSet<usize>>, token: String, cluster: usize) {
    let owners = tokens.entry(token).or_default();
    if owners.insert(cluster) && owners.len() > 1 {
        tracing::debug!(?owners, cluster, "token shared by several clusters");
    }
}

// =============================================================================
// CLUSTERING
// =============================================================================

/// Resolve identities across an ordered fragment stream.
pub fn cluster(fragments: &[Fragment]) -> Vec<Agent> {
    let mut clusters: Vec<Agent> = Vec::new();
    let mut index = IdentityIndex::default();

    for fragment in fragments.iter().filter(|f| f.is_identifiable()) {
        let position = match index.find(fragment) {
            Some(position) => {
                let existing = &mut clusters[position];
                deep_merge(existing, fragment);
                record_history(existing, fragment);
                position
            }
            None => {
                clusters.push(Agent::from(fragment));
                clusters.len() - 1
            }
        };

        index.register(fragment, position);
    }

    tracing::debug!(
        fragments = fragments.len(),
        agents = clusters.len(),
        tokens = index.len(),
        "clustering done"
    );

    clusters
}

/// Normalize every sheet and tag each fragment with its label and period.
/// Output follows sheet order, then row order.
pub fn flatten(sheets: &Sheets) -> Vec<Fragment> {
    sheets
        .iter()
        .flat_map(|(label, rows)| {
            let fragments = normalize(rows);
            if fragments.is_empty() {
                tracing::debug!(%label, rows = rows.len(), "sheet produced no fragments");
            }
            fragments.into_iter().map(move |f| f.tagged(label))
        })
        .collect()
}

/// Full pipeline over a set of sheets.
pub fn merge(sheets: &Sheets) -> Vec<Agent> {
    cluster(&flatten(sheets))
}

/// Agents whose current period is the newest one present.
pub fn latest_snapshot(agents: &[Agent]) -> Vec<Agent> {
    let Some(latest) = latest_period(agents) else {
        return Vec::new();
    };
    agents
        .iter()
        .filter(|a| &a.period == latest)
        .cloned()
        .collect()
}

pub fn latest_period(agents: &[Agent]) -> Option<&Period> {
    agents.iter().map(|a| &a.period).max()
}

// =============================================================================
// MERGE RULES
// =============================================================================

fn is_admin_empty(value: Option<&CellValue>) -> bool {
    match value {
        None => true,
        Some(CellValue::Text(s)) => {
            let trimmed = s.trim();
            trimmed.is_empty() || trimmed == "-"
        }
        Some(v) => v.is_blank(),
    }
}

fn has_marker(label: &str, marker: &str) -> bool {
    label.to_uppercase().contains(marker)
}

/// Fold `source` into the cluster's current state. History is left alone.
pub fn deep_merge(target: &mut Agent, source: &Fragment) {
    let source_is_current = source.period >= target.period;

    for (key, value) in source.kpis.values() {
        if target.kpis.get(key).is_none() || source_is_current {
            target.kpis.set(key, Some(value));
        }
    }

    for (field, value) in &source.admin.fields {
        if is_admin_empty(Some(value)) {
            continue;
        }
        if is_admin_empty(target.admin.fields.get(field)) || source_is_current {
            target.admin.fields.insert(*field, value.clone());
        }
    }
    for (day, code) in &source.admin.daily_control {
        if is_admin_empty(Some(code)) {
            continue;
        }
        if is_admin_empty(target.admin.daily_control.get(day)) || source_is_current {
            target.admin.daily_control.insert(day.clone(), code.clone());
        }
    }

    // Fuller names usually carry surnames.
    if source.has_name()
        && (!is_usable_name(&target.agent)
            || source.agent.chars().count() >= target.agent.chars().count())
    {
        target.agent = source.agent.clone();
    }

    if source.id.is_some() {
        target.id = source.id.clone();
    }

    if source.supervisor != UNASSIGNED_SUPERVISOR && !source.supervisor.trim().is_empty() {
        target.supervisor = source.supervisor.clone();
    }

    target.source = pick_source(target, source);

    if source.period > target.period {
        target.period = source.period.clone();
    }

    if target.agent.trim().is_empty() {
        target.agent = UNKNOWN_AGENT.to_string();
    }
}

fn pick_source(target: &Agent, source: &Fragment) -> String {
    if source.period > target.period {
        return source.source.clone();
    }
    if source.period == target.period {
        for marker in AUTHORITATIVE_MARKERS {
            if has_marker(&source.source, marker) && !has_marker(&target.source, marker) {
                return source.source.clone();
            }
        }
    }
    target.source.clone()
}

/// One history entry per period: overlay into an existing entry or append
/// a new one and keep the list sorted.
pub fn record_history(agent: &mut Agent, fragment: &Fragment) {
    if let Some(entry) = agent
        .history
        .iter_mut()
        .find(|h| h.period == fragment.period)
    {
        tracing::debug!(
            agent = %agent.agent,
            period = %fragment.period,
            "merging into existing history entry"
        );
        entry.kpis.overlay(&fragment.kpis);

        let promoted = AUTHORITATIVE_MARKERS
            .iter()
            .any(|m| has_marker(&fragment.source, m))
            && !AUTHORITATIVE_MARKERS
                .iter()
                .any(|m| has_marker(&entry.source, m));
        if promoted {
            entry.source = fragment.source.clone();
        }
        return;
    }

    tracing::debug!(
        agent = %agent.agent,
        period = %fragment.period,
        "creating new history entry"
    );
    agent.history.push(HistoryEntry::from_fragment(fragment));
    agent.history.sort_by(|a, b| a.period.cmp(&b.period));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdminField, KpiKey, Kpis};
    use crate::value::RawRow;

    fn fragment(agent: &str, id: Option<&str>, label: &str) -> Fragment {
        Fragment {
            agent: agent.to_string(),
            id: id.map(str::to_string),
            supervisor: UNASSIGNED_SUPERVISOR.to_string(),
            kpis: Kpis::default(),
            admin: Default::default(),
            source: String::new(),
            period: Period::default(),
        }
        .tagged(label)
    }

    fn with_kpi(mut f: Fragment, key: KpiKey, value: f64) -> Fragment {
        f.kpis.set(key, Some(value));
        f
    }

    fn row(cells: &[(&str, CellValue)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    // -------------------------------------------------------------------------
    // CLUSTERING
    // -------------------------------------------------------------------------

    #[test]
    fn test_distinct_ids_give_one_agent_each() {
        let fragments: Vec<Fragment> = (0..5)
            .map(|i| fragment(&format!("Agent {i}"), Some(&format!("ID{i}")), "KPI_2025_12.xlsx"))
            .collect();
        let agents = cluster(&fragments);
        assert_eq!(agents.len(), 5);
        assert!(agents.iter().all(|a| a.history.len() == 1));
        let names: Vec<&str> = agents.iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(names, vec!["Agent 0", "Agent 1", "Agent 2", "Agent 3", "Agent 4"]);
    }

    #[test]
    fn test_same_id_different_name_casing_merges() {
        let fragments = vec![
            fragment("maria test", Some(" ab12 "), "KPI_2025_12.xlsx"),
            fragment("MARIA TEST GARCIA", Some("AB12"), "Control_2025_12.xlsx"),
        ];
        let agents = cluster(&fragments);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].agent, "MARIA TEST GARCIA");
    }

    #[test]
    fn test_name_match_links_id_to_nameless_sources() {
        let fragments = vec![
            fragment("Luis Perez", None, "KPI_2025_11.xlsx"),
            fragment(" luis perez ", Some("LP01"), "Control_2025_11.xlsx"),
            fragment(UNKNOWN_AGENT, Some("lp01"), "Extra_2025_11.xlsx"),
        ];
        let agents = cluster(&fragments);
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id.as_deref(), Some("lp01"));
        assert_eq!(agents[0].agent, " luis perez ");
    }

    #[test]
    fn test_unidentifiable_fragments_are_skipped() {
        let fragments = vec![
            fragment(UNKNOWN_AGENT, None, "a.xlsx"),
            fragment("", None, "a.xlsx"),
        ];
        assert!(cluster(&fragments).is_empty());
    }

    #[test]
    fn test_id_wins_over_conflicting_name() {
        let fragments = vec![
            fragment("Ana", Some("A1"), "KPI_2025_12.xlsx"),
            fragment("Bea", Some("B1"), "KPI_2025_12.xlsx"),
            // ID says Ana's cluster, name says Bea's.
            fragment("Bea", Some("a1"), "Control_2025_12.xlsx"),
        ];
        let agents = cluster(&fragments);
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].id.as_deref(), Some("a1"));
        assert_eq!(agents[1].agent, "Bea");
    }

    #[test]
    fn test_identity_index_is_monotonic() {
        let mut index = IdentityIndex::default();
        let f = fragment("Ana", Some("A1"), "x.xlsx");
        index.register(&f, 0);
        index.register(&f, 3);
        assert_eq!(index.find(&f), Some(0));
        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_shared_name_resolves_to_earliest_cluster() {
        let fragments = vec![
            fragment("Ana", Some("1"), "KPI_2025_12.xlsx"),
            fragment("Bea", Some("2"), "KPI_2025_12.xlsx"),
            // XAVI lands in Bea's cluster through ID 2...
            fragment("Xavi", Some("2"), "KPI_2025_12.xlsx"),
            // ...and in Ana's cluster through ID 1.
            fragment("Xavi", Some("1"), "KPI_2025_12.xlsx"),
        ];
        let mut index = IdentityIndex::default();
        for (f, position) in fragments.iter().zip([0, 1, 1, 0]) {
            index.register(f, position);
        }
        let by_name = fragment("Xavi", None, "KPI_2025_12.xlsx");
        assert_eq!(index.find(&by_name), Some(0));

        let mut stream = fragments;
        stream.push(with_kpi(by_name, KpiKey::Aht, 999.0));
        let agents = cluster(&stream);
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].kpis.get(KpiKey::Aht), Some(999.0));
        assert_eq!(agents[1].kpis.get(KpiKey::Aht), None);
    }

    #[test]
    fn test_unknown_name_is_not_a_token() {
        let mut index = IdentityIndex::default();
        index.register(&fragment(UNKNOWN_AGENT, Some("X"), "x.xlsx"), 0);
        assert_eq!(index.find(&fragment(UNKNOWN_AGENT, None, "x.xlsx")), None);
    }

    // -------------------------------------------------------------------------
    // HISTORY
    // -------------------------------------------------------------------------

    #[test]
    fn test_same_period_history_overlay() {
        let a = with_kpi(fragment("Maria Test", None, "KPI_2025_12.xlsx"), KpiKey::GestH, 1.5);
        let b = with_kpi(fragment("Maria Test", None, "Complementario W52.xlsx"), KpiKey::NcoBo, 1.0);
        let agents = cluster(&[a, b]);
        assert_eq!(agents.len(), 1);
        let history = &agents[0].history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].period, Period::month(2025, 12));
        assert_eq!(history[0].kpis.get(KpiKey::GestH), Some(1.5));
        assert_eq!(history[0].kpis.get(KpiKey::NcoBo), Some(1.0));
        assert_eq!(history[0].source, "KPI_2025_12.xlsx");
    }

    #[test]
    fn test_history_source_promoted_to_kpi_label() {
        let a = fragment("Ana", None, "Control usuarios W52.xlsx");
        let b = fragment("Ana", None, "RESULTADOS_2025_12.xlsx");
        let c = fragment("Ana", None, "KPI_2025_12.xlsx");
        let agents = cluster(&[a, b, c]);
        // RESULT promoted first; KPI does not displace an authoritative label.
        assert_eq!(agents[0].history[0].source, "RESULTADOS_2025_12.xlsx");
    }

    #[test]
    fn test_history_sorted_by_period() {
        let fragments = vec![
            fragment("Ana", None, "KPI_2025_12.xlsx"),
            fragment("Ana", None, "KPI_2025_10.xlsx"),
            fragment("Ana", None, "notes.xlsx"),
            fragment("Ana", None, "KPI_2024_12.xlsx"),
        ];
        let agents = cluster(&fragments);
        let periods: Vec<String> = agents[0].history.iter().map(|h| h.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-12", "2025-10", "2025-12", "notes.xlsx"]);
    }

    // -------------------------------------------------------------------------
    // DEEP MERGE
    // -------------------------------------------------------------------------

    #[test]
    fn test_newer_period_overrides_kpis() {
        let old = with_kpi(fragment("Ana", None, "KPI_2025_11.xlsx"), KpiKey::Aht, 300.0);
        let new = with_kpi(fragment("Ana", None, "KPI_2025_12.xlsx"), KpiKey::Aht, 280.0);
        let mut agent = Agent::from(&new);
        deep_merge(&mut agent, &old);
        assert_eq!(agent.kpis.get(KpiKey::Aht), Some(280.0));
        assert_eq!(agent.period, Period::month(2025, 12));
        assert_eq!(agent.source, "KPI_2025_12.xlsx");

        let mut agent = Agent::from(&old);
        deep_merge(&mut agent, &new);
        assert_eq!(agent.kpis.get(KpiKey::Aht), Some(280.0));
        assert_eq!(agent.period, Period::month(2025, 12));
        assert_eq!(agent.source, "KPI_2025_12.xlsx");
    }

    #[test]
    fn test_older_period_fills_empty_kpis_only() {
        let new = with_kpi(fragment("Ana", None, "KPI_2025_12.xlsx"), KpiKey::Aht, 280.0);
        let old = with_kpi(
            with_kpi(fragment("Ana", None, "KPI_2025_11.xlsx"), KpiKey::Aht, 300.0),
            KpiKey::Nps,
            40.0,
        );
        let mut agent = Agent::from(&new);
        deep_merge(&mut agent, &old);
        assert_eq!(agent.kpis.get(KpiKey::Aht), Some(280.0));
        assert_eq!(agent.kpis.get(KpiKey::Nps), Some(40.0));
    }

    #[test]
    fn test_same_period_tie_favors_source() {
        let a = with_kpi(fragment("Ana", None, "KPI_2025_12.xlsx"), KpiKey::Aht, 300.0);
        let b = with_kpi(fragment("Ana", None, "Control_2025_12.xlsx"), KpiKey::Aht, 310.0);
        let mut agent = Agent::from(&a);
        deep_merge(&mut agent, &b);
        assert_eq!(agent.kpis.get(KpiKey::Aht), Some(310.0));
        // KPI label kept on tie.
        assert_eq!(agent.source, "KPI_2025_12.xlsx");
    }

    #[test]
    fn test_same_period_source_label_tiers() {
        let control = fragment("Ana", None, "Control_2025_12.xlsx");
        let results = fragment("Ana", None, "RESULTADOS_2025_12.xlsx");
        let other = fragment("Ana", None, "Otro_2025_12.xlsx");
        let kpi = fragment("Ana", None, "KPI_2025_12.xlsx");

        let mut agent = Agent::from(&control);
        deep_merge(&mut agent, &results);
        assert_eq!(agent.source, "RESULTADOS_2025_12.xlsx");

        // No marker on the incoming label: keep the current one.
        deep_merge(&mut agent, &other);
        assert_eq!(agent.source, "RESULTADOS_2025_12.xlsx");

        // KPI outranks RESULT.
        deep_merge(&mut agent, &kpi);
        assert_eq!(agent.source, "KPI_2025_12.xlsx");

        let mut agent = Agent::from(&control);
        deep_merge(&mut agent, &other);
        assert_eq!(agent.source, "Control_2025_12.xlsx");
    }

    #[test]
    fn test_admin_dash_is_empty() {
        let mut new = fragment("Ana", None, "KPI_2025_12.xlsx");
        new.admin.fields.insert(AdminField::Dni, CellValue::from("-"));
        let mut old = fragment("Ana", None, "Control_2025_11.xlsx");
        old.admin.fields.insert(AdminField::Dni, CellValue::from("12345678Z"));
        old.admin.fields.insert(AdminField::Email, CellValue::from("ana@example.com"));

        let mut agent = Agent::from(&new);
        deep_merge(&mut agent, &old);
        assert_eq!(agent.admin.get(AdminField::Dni), Some(&CellValue::from("12345678Z")));
        assert_eq!(
            agent.admin.get(AdminField::Email),
            Some(&CellValue::from("ana@example.com"))
        );

        // A dash never blanks out a value, even from a newer period.
        let mut dash = fragment("Ana", None, "KPI_2026_01.xlsx");
        dash.admin.fields.insert(AdminField::Dni, CellValue::from("-"));
        deep_merge(&mut agent, &dash);
        assert_eq!(agent.admin.get(AdminField::Dni), Some(&CellValue::from("12345678Z")));
    }

    #[test]
    fn test_daily_control_merged_per_day() {
        let mut a = fragment("Ana", None, "Control_2025_12.xlsx");
        a.admin.daily_control.insert("20251201".into(), CellValue::from("T"));
        let mut b = fragment("Ana", None, "Control_2025_12.xlsx");
        b.admin.daily_control.insert("20251202".into(), CellValue::from("V"));
        let mut agent = Agent::from(&a);
        deep_merge(&mut agent, &b);
        assert_eq!(agent.admin.daily_control.len(), 2);
    }

    #[test]
    fn test_name_supervisor_and_id_rules() {
        let mut a = fragment("Ana Garcia Lopez", Some("A1"), "KPI_2025_12.xlsx");
        a.supervisor = "TEAM A".to_string();
        let b = fragment("Ana", None, "KPI_2025_12.xlsx");
        let mut agent = Agent::from(&a);
        deep_merge(&mut agent, &b);
        assert_eq!(agent.agent, "Ana Garcia Lopez");
        assert_eq!(agent.supervisor, "TEAM A");
        assert_eq!(agent.id.as_deref(), Some("A1"));

        let mut c = fragment(UNKNOWN_AGENT, Some("a1"), "KPI_2025_12.xlsx");
        c.supervisor = "TEAM B".to_string();
        deep_merge(&mut agent, &c);
        assert_eq!(agent.agent, "Ana Garcia Lopez");
        assert_eq!(agent.supervisor, "TEAM B");
        assert_eq!(agent.id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_real_name_replaces_placeholder() {
        let a = fragment(UNKNOWN_AGENT, Some("A1"), "KPI_2025_12.xlsx");
        let b = fragment("Ana", Some("A1"), "Control_2025_12.xlsx");
        let agents = cluster(&[a, b]);
        assert_eq!(agents[0].agent, "Ana");
    }

    #[test]
    fn test_deep_merge_leaves_history_alone() {
        let a = fragment("Ana", None, "KPI_2025_12.xlsx");
        let b = fragment("Ana", None, "KPI_2025_11.xlsx");
        let mut agent = Agent::from(&a);
        deep_merge(&mut agent, &b);
        assert_eq!(agent.history.len(), 1);
    }

    // -------------------------------------------------------------------------
    // PIPELINE
    // -------------------------------------------------------------------------

    #[test]
    fn test_merge_two_december_sheets() {
        let mut sheets = Sheets::new();
        sheets.insert(
            "KPI_2025_12.xlsx::Hoja1".to_string(),
            vec![row(&[
                ("Nombre", CellValue::from("Maria Test")),
                ("GEST/H", CellValue::Number(1.5)),
                ("NCO BO%", CellValue::Empty),
            ])],
        );
        sheets.insert(
            "Complementario W52.xlsx::Hoja1".to_string(),
            vec![row(&[
                ("Nombre", CellValue::from("Maria Test")),
                ("GEST/H", CellValue::Empty),
                ("NCO BO%", CellValue::Number(1.0)),
            ])],
        );

        let agents = merge(&sheets);
        assert_eq!(agents.len(), 1);
        let maria = &agents[0];
        assert_eq!(maria.agent, "Maria Test");
        let entry = maria.history_for(&Period::month(2025, 12)).expect("december entry");
        assert_eq!(entry.kpis.get(KpiKey::GestH), Some(1.5));
        assert_eq!(entry.kpis.get(KpiKey::NcoBo), Some(1.0));
        assert_eq!(maria.kpis.get(KpiKey::GestH), Some(1.5));
        assert_eq!(maria.kpis.get(KpiKey::NcoBo), Some(1.0));
    }

    #[test]
    fn test_flatten_tags_fragments() {
        let mut sheets = Sheets::new();
        sheets.insert("empty".to_string(), Vec::new());
        sheets.insert(
            "KPI_2025_03.xlsx::Datos".to_string(),
            vec![row(&[("Nombre", CellValue::from("Ana"))])],
        );
        let fragments = flatten(&sheets);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].source, "KPI_2025_03.xlsx::Datos");
        assert_eq!(fragments[0].period, Period::month(2025, 3));
    }

    #[test]
    fn test_latest_snapshot() {
        let fragments = vec![
            fragment("Ana", None, "KPI_2025_12.xlsx"),
            fragment("Bea", None, "KPI_2025_11.xlsx"),
            fragment("Carla", None, "KPI_2025_12.xlsx"),
        ];
        let agents = cluster(&fragments);
        let latest = latest_snapshot(&agents);
        let names: Vec<&str> = latest.iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Carla"]);
        assert!(latest_snapshot(&[]).is_empty());
    }
}
