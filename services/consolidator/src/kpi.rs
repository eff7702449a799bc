//! KPI targets and the gap analysis built on top of them.
//!
//! The configuration is an ordered list of [`KpiDefinition`]s. Users may
//! tune `target`, `importance` and `warningThreshold`; keys, labels and
//! directions always come from the built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ConsolidateResult;
use crate::model::{KpiKey, Kpis};

pub const DEFAULT_IMPORTANCE: u8 = 3;
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.15;

/// Direction of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Higher is better; the target is a floor.
    Min,
    /// Lower is better; the target is a ceiling.
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDefinition {
    pub key: KpiKey,
    pub label: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub target: f64,
    #[serde(default)]
    pub is_percent: bool,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub description: String,
}

fn default_warning_threshold() -> f64 {
    DEFAULT_WARNING_THRESHOLD
}

fn default_importance() -> u8 {
    DEFAULT_IMPORTANCE
}

impl KpiDefinition {
    fn new(
        key: KpiKey,
        label: &str,
        target_type: TargetType,
        target: f64,
        decimals: u8,
        description: &str,
    ) -> Self {
        KpiDefinition {
            key,
            label: label.to_string(),
            target_type,
            target,
            is_percent: key.is_percent(),
            decimals,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            importance: DEFAULT_IMPORTANCE,
            description: description.to_string(),
        }
    }

    pub fn is_met(&self, value: f64) -> bool {
        match self.target_type {
            TargetType::Min => value >= self.target,
            TargetType::Max => value <= self.target,
        }
    }

    /// Signed distance to target; negative means the target is missed.
    pub fn gap(&self, value: f64) -> f64 {
        match self.target_type {
            TargetType::Min => value - self.target,
            TargetType::Max => self.target - value,
        }
    }
}

/// Built-in targets.
pub fn default_kpi_config() -> Vec<KpiDefinition> {
    use TargetType::{Max, Min};
    vec![
        KpiDefinition::new(KpiKey::GestH, "GEST/H", Min, 2.5, 2, "Expedientes gestionados por hora"),
        KpiDefinition::new(KpiKey::CerrH, "CERR/H", Min, 1.8, 2, "Expedientes cerrados por hora"),
        KpiDefinition::new(KpiKey::NcoBo, "NCO BO%", Min, 85.0, 0, "Nivel calidad objetiva BackOffice"),
        KpiDefinition::new(KpiKey::Aht, "AHT", Max, 340.0, 0, "Tiempo medio de operación (segundos)"),
        KpiDefinition::new(KpiKey::Tipif, "TIPIF %", Min, 90.0, 0, "Porcentaje de tipificación correcta"),
        KpiDefinition::new(KpiKey::Transfer, "TRANS %", Max, 15.0, 0, "Porcentaje de transferencias"),
        KpiDefinition::new(KpiKey::Nps, "NPS", Min, 30.0, 0, "Net Promoter Score"),
        KpiDefinition::new(KpiKey::Ncp, "NCP", Min, 9.0, 0, "No Conformidad de Proceso"),
        KpiDefinition::new(KpiKey::NcoCall, "NCO LLAM%", Min, 85.0, 0, "Nivel calidad objetiva Llamadas"),
    ]
}

/// User-editable part of a saved definition. Everything else in the saved
/// file is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedKpi {
    pub key: String,
    pub target: f64,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub warning_threshold: Option<f64>,
}

/// Apply saved overrides to the defaults. Defaults missing from `saved`
/// are kept as they are; saved keys unknown to the defaults are dropped.
pub fn merge_with_defaults(saved: &[SavedKpi]) -> Vec<KpiDefinition> {
    default_kpi_config()
        .into_iter()
        .map(|mut def| {
            if let Some(s) = saved.iter().find(|s| s.key == def.key.as_str()) {
                def.target = s.target;
                def.importance = s.importance.unwrap_or(DEFAULT_IMPORTANCE).clamp(1, 5);
                def.warning_threshold = s.warning_threshold.unwrap_or(DEFAULT_WARNING_THRESHOLD);
            }
            def
        })
        .collect()
}

/// Read a saved configuration; a missing file means "use the defaults".
pub async fn load_kpi_config(path: &Path) -> ConsolidateResult<Vec<KpiDefinition>> {
    if !fs::try_exists(path).await? {
        tracing::debug!(path = %path.display(), "no saved KPI config, using defaults");
        return Ok(default_kpi_config());
    }
    let content = fs::read_to_string(path).await?;
    let saved: Vec<SavedKpi> = serde_json::from_str(&content)?;
    Ok(merge_with_defaults(&saved))
}

pub async fn save_kpi_config(path: &Path, config: &[KpiDefinition]) -> ConsolidateResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, serde_json::to_vec_pretty(config)?).await?;
    tracing::info!(path = %path.display(), kpis = config.len(), "KPI config saved");
    Ok(())
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// One missed target, ranked by how badly it is missed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiGap {
    pub key: KpiKey,
    pub label: String,
    pub actual: f64,
    pub target: f64,
    pub gap: f64,
    /// Gap relative to target, times importance. More negative is worse.
    pub weighted_score: f64,
}

/// Missed targets, worst first, at most `top_n`.
pub fn identify_top_kpis(kpis: &Kpis, config: &[KpiDefinition], top_n: usize) -> Vec<KpiGap> {
    let mut failed: Vec<KpiGap> = config
        .iter()
        .filter_map(|def| {
            let actual = kpis.get(def.key)?;
            let gap = def.gap(actual);
            if gap >= 0.0 {
                return None;
            }
            let base = if def.target != 0.0 { def.target } else { 1.0 };
            Some(KpiGap {
                key: def.key,
                label: def.label.clone(),
                actual,
                target: def.target,
                gap,
                weighted_score: gap / base * f64::from(def.importance),
            })
        })
        .collect();

    failed.sort_by(|a, b| a.weighted_score.total_cmp(&b.weighted_score));
    failed.truncate(top_n);
    failed
}

pub fn identify_priority_kpi(kpis: &Kpis, config: &[KpiDefinition]) -> Option<KpiGap> {
    identify_top_kpis(kpis, config, 1).into_iter().next()
}

/// Share of measured KPIs that meet their target; 0 when nothing is measured.
pub fn success_rate(kpis: &Kpis, config: &[KpiDefinition]) -> f64 {
    let (measured, met) = config
        .iter()
        .filter_map(|def| kpis.get(def.key).map(|v| def.is_met(v)))
        .fold((0usize, 0usize), |(measured, met), ok| {
            (measured + 1, met + usize::from(ok))
        });
    if measured == 0 {
        0.0
    } else {
        met as f64 / measured as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    High,
    Stable,
    Low,
}

impl PerformanceTier {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 0.8 {
            PerformanceTier::High
        } else if rate < 0.5 {
            PerformanceTier::Low
        } else {
            PerformanceTier::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::High => "high_performance",
            PerformanceTier::Stable => "stable",
            PerformanceTier::Low => "low_performance",
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn performance_tier(kpis: &Kpis, config: &[KpiDefinition]) -> PerformanceTier {
    PerformanceTier::from_rate(success_rate(kpis, config))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    Success,
    Warning,
    Critical,
    Neutral,
}

impl KpiStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiStatus::Success => "success",
            KpiStatus::Warning => "warning",
            KpiStatus::Critical => "critical",
            KpiStatus::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic-light status of one value against its definition.
pub fn kpi_status(value: Option<f64>, def: &KpiDefinition) -> KpiStatus {
    let Some(value) = value else {
        return KpiStatus::Neutral;
    };
    if def.target == 0.0 {
        return KpiStatus::Neutral;
    }
    if def.is_met(value) {
        return KpiStatus::Success;
    }
    let deviation = ((value - def.target) / def.target).abs();
    if deviation < def.warning_threshold {
        KpiStatus::Warning
    } else {
        KpiStatus::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(key: KpiKey) -> KpiDefinition {
        default_kpi_config()
            .into_iter()
            .find(|d| d.key == key)
            .expect("default exists")
    }

    // -------------------------------------------------------------------------
    // CONFIG
    // -------------------------------------------------------------------------

    #[test]
    fn test_defaults() {
        let config = default_kpi_config();
        assert_eq!(config.len(), 9);
        assert!(config.iter().all(|d| d.importance == 3));
        assert!(config.iter().all(|d| d.warning_threshold == 0.15));
        assert_eq!(def(KpiKey::Aht).target_type, TargetType::Max);
        assert!(def(KpiKey::NcoBo).is_percent);
        assert!(!def(KpiKey::GestH).is_percent);
    }

    #[test]
    fn test_merge_with_defaults() {
        let saved: Vec<SavedKpi> = serde_json::from_str(
            r#"[
                {"key": "aht", "target": 300, "importance": 5, "type": "min"},
                {"key": "gestH", "target": 3.0},
                {"key": "hold", "target": 10}
            ]"#,
        )
        .unwrap();
        let config = merge_with_defaults(&saved);
        assert_eq!(config.len(), 9);

        let aht = config.iter().find(|d| d.key == KpiKey::Aht).unwrap();
        assert_eq!(aht.target, 300.0);
        assert_eq!(aht.importance, 5);
        // direction is not user-editable
        assert_eq!(aht.target_type, TargetType::Max);

        let gest = config.iter().find(|d| d.key == KpiKey::GestH).unwrap();
        assert_eq!(gest.target, 3.0);
        assert_eq!(gest.importance, 3);
        assert_eq!(gest.warning_threshold, 0.15);
    }

    #[test]
    fn test_definition_json_shape() {
        let json = serde_json::to_value(def(KpiKey::NcoBo)).unwrap();
        assert_eq!(json["key"], "ncoBO");
        assert_eq!(json["type"], "min");
        assert_eq!(json["isPercent"], true);
        assert_eq!(json["warningThreshold"], 0.15);
    }

    #[tokio::test]
    async fn test_load_missing_config_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_kpi_config(&dir.path().join("missing.json")).await.unwrap();
        assert_eq!(config, default_kpi_config());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kpis.json");
        let mut config = default_kpi_config();
        config[0].target = 4.0;
        config[0].importance = 1;
        save_kpi_config(&path, &config).await.unwrap();

        let loaded = load_kpi_config(&path).await.unwrap();
        assert_eq!(loaded[0].target, 4.0);
        assert_eq!(loaded[0].importance, 1);
    }

    // -------------------------------------------------------------------------
    // ANALYSIS
    // -------------------------------------------------------------------------

    #[test]
    fn test_top_kpis_ranked_by_weighted_gap() {
        let kpis: Kpis = [
            (KpiKey::GestH, 2.0),   // -0.5 / 2.5 * 3 = -0.6
            (KpiKey::Aht, 374.0),   // -34 / 340 * 3 = -0.3
            (KpiKey::NcoBo, 90.0),  // met
            (KpiKey::Nps, 15.0),    // -15 / 30 * 3 = -1.5
        ]
        .into_iter()
        .collect();
        let config = default_kpi_config();

        let top = identify_top_kpis(&kpis, &config, 3);
        let keys: Vec<KpiKey> = top.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![KpiKey::Nps, KpiKey::GestH, KpiKey::Aht]);
        assert!((top[0].weighted_score + 1.5).abs() < 1e-9);
        assert_eq!(top[0].actual, 15.0);

        assert_eq!(identify_top_kpis(&kpis, &config, 1).len(), 1);
        assert_eq!(
            identify_priority_kpi(&kpis, &config).map(|g| g.key),
            Some(KpiKey::Nps)
        );
    }

    #[test]
    fn test_importance_changes_priority() {
        let kpis: Kpis = [(KpiKey::GestH, 2.0), (KpiKey::Nps, 27.0)].into_iter().collect();
        let mut config = default_kpi_config();
        // gestH: -0.2 * 1 ; nps: -0.1 * 5
        config.iter_mut().find(|d| d.key == KpiKey::GestH).unwrap().importance = 1;
        config.iter_mut().find(|d| d.key == KpiKey::Nps).unwrap().importance = 5;
        assert_eq!(
            identify_priority_kpi(&kpis, &config).map(|g| g.key),
            Some(KpiKey::Nps)
        );
    }

    #[test]
    fn test_zero_target_does_not_divide_by_zero() {
        let mut config = vec![def(KpiKey::Transfer)];
        config[0].target = 0.0;
        let kpis: Kpis = [(KpiKey::Transfer, 5.0)].into_iter().collect();
        let top = identify_top_kpis(&kpis, &config, 3);
        assert_eq!(top[0].weighted_score, -15.0);
    }

    #[test]
    fn test_no_failures_no_priority() {
        let kpis: Kpis = [(KpiKey::GestH, 3.0)].into_iter().collect();
        assert!(identify_priority_kpi(&kpis, &default_kpi_config()).is_none());
        assert!(identify_priority_kpi(&Kpis::default(), &default_kpi_config()).is_none());
    }

    #[test]
    fn test_success_rate_and_tier() {
        let config = default_kpi_config();
        assert_eq!(success_rate(&Kpis::default(), &config), 0.0);

        let kpis: Kpis = [
            (KpiKey::GestH, 3.0),
            (KpiKey::CerrH, 2.0),
            (KpiKey::Aht, 300.0),
            (KpiKey::Nps, 10.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(success_rate(&kpis, &config), 0.75);
        assert_eq!(performance_tier(&kpis, &config), PerformanceTier::Stable);

        assert_eq!(PerformanceTier::from_rate(0.8), PerformanceTier::High);
        assert_eq!(PerformanceTier::from_rate(0.49), PerformanceTier::Low);
        assert_eq!(PerformanceTier::from_rate(0.5), PerformanceTier::Stable);
    }

    #[test]
    fn test_kpi_status() {
        let gest = def(KpiKey::GestH);
        assert_eq!(kpi_status(None, &gest), KpiStatus::Neutral);
        assert_eq!(kpi_status(Some(2.5), &gest), KpiStatus::Success);
        assert_eq!(kpi_status(Some(2.3), &gest), KpiStatus::Warning);
        assert_eq!(kpi_status(Some(1.0), &gest), KpiStatus::Critical);

        let aht = def(KpiKey::Aht);
        assert_eq!(kpi_status(Some(320.0), &aht), KpiStatus::Success);
        assert_eq!(kpi_status(Some(360.0), &aht), KpiStatus::Warning);
        assert_eq!(kpi_status(Some(450.0), &aht), KpiStatus::Critical);

        let mut zero = def(KpiKey::Transfer);
        zero.target = 0.0;
        assert_eq!(kpi_status(Some(3.0), &zero), KpiStatus::Neutral);
    }
}
