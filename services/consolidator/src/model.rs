//! Data model shared by the normalizer, the merger and their consumers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::period::{extract_period, Period};
use crate::value::{CellValue, Segment};

/// Display name used when a row carries no usable name.
pub const UNKNOWN_AGENT: &str = "Desconocido";

/// Supervisor used when a row carries no team / manager.
pub const UNASSIGNED_SUPERVISOR: &str = "Sin Asignar";

// =============================================================================
// KPIs
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KpiKey {
    #[serde(rename = "gestH")]
    GestH,
    #[serde(rename = "cerrH")]
    CerrH,
    #[serde(rename = "ncoBO")]
    NcoBo,
    #[serde(rename = "ncoCall")]
    NcoCall,
    #[serde(rename = "adherence")]
    Adherence,
    #[serde(rename = "tipif")]
    Tipif,
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "aht")]
    Aht,
    #[serde(rename = "nps")]
    Nps,
    #[serde(rename = "ncp")]
    Ncp,
    #[serde(rename = "calls")]
    Calls,
    #[serde(rename = "gestTotal")]
    GestTotal,
    #[serde(rename = "cerrTotal")]
    CerrTotal,
}

impl KpiKey {
    pub const ALL: [KpiKey; 13] = [
        KpiKey::GestH,
        KpiKey::CerrH,
        KpiKey::NcoBo,
        KpiKey::NcoCall,
        KpiKey::Adherence,
        KpiKey::Tipif,
        KpiKey::Transfer,
        KpiKey::Aht,
        KpiKey::Nps,
        KpiKey::Ncp,
        KpiKey::Calls,
        KpiKey::GestTotal,
        KpiKey::CerrTotal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiKey::GestH => "gestH",
            KpiKey::CerrH => "cerrH",
            KpiKey::NcoBo => "ncoBO",
            KpiKey::NcoCall => "ncoCall",
            KpiKey::Adherence => "adherence",
            KpiKey::Tipif => "tipif",
            KpiKey::Transfer => "transfer",
            KpiKey::Aht => "aht",
            KpiKey::Nps => "nps",
            KpiKey::Ncp => "ncp",
            KpiKey::Calls => "calls",
            KpiKey::GestTotal => "gestTotal",
            KpiKey::CerrTotal => "cerrTotal",
        }
    }

    /// Percent-typed KPIs go through `normalize_percent`, counters through
    /// `parse_number`.
    pub fn is_percent(&self) -> bool {
        matches!(
            self,
            KpiKey::NcoBo | KpiKey::NcoCall | KpiKey::Adherence | KpiKey::Tipif | KpiKey::Transfer
        )
    }
}

impl std::fmt::Display for KpiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// KPI snapshot. Every key is always present; `None` means "no value".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kpis(BTreeMap<KpiKey, Option<f64>>);

impl Default for Kpis {
    fn default() -> Self {
        Kpis(KpiKey::ALL.iter().map(|k| (*k, None)).collect())
    }
}

impl Kpis {
    pub fn get(&self, key: KpiKey) -> Option<f64> {
        self.0.get(&key).copied().flatten()
    }

    pub fn set(&mut self, key: KpiKey, value: Option<f64>) {
        self.0.insert(key, value);
    }

    /// Keys that carry a value, in key order.
    pub fn values(&self) -> impl Iterator<Item = (KpiKey, f64)> + '_ {
        self.0.iter().filter_map(|(k, v)| v.map(|v| (*k, v)))
    }

    pub fn has_any(&self) -> bool {
        self.values().next().is_some()
    }

    /// Copy every non-empty value of `other` over `self`; empty values never
    /// blank out an existing one.
    pub fn overlay(&mut self, other: &Kpis) {
        for (key, value) in other.values() {
            self.0.insert(key, Some(value));
        }
    }
}

impl FromIterator<(KpiKey, f64)> for Kpis {
    fn from_iter<I: IntoIterator<Item = (KpiKey, f64)>>(iter: I) -> Self {
        let mut kpis = Kpis::default();
        for (key, value) in iter {
            kpis.set(key, Some(value));
        }
        kpis
    }
}

// =============================================================================
// ADMIN ATTRIBUTES
// =============================================================================

/// How a raw admin cell is turned into a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminKind {
    Plain,
    ExcelDate,
    Segment,
    Salesforce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdminField {
    // identity
    Dni,
    Email,
    Tlf,
    Login,
    Extension,
    // work info
    Service,
    Category,
    Segment,
    Language,
    Antiguedad,
    Tm,
    Schedule,
    Emea,
    Ilt,
    // systems
    UserRed,
    UserSitel,
    UserSyr,
    Salesforce,
    Amadeus,
    Resiber,
    Callcenter,
    Desktop,
    // skills / queues
    Asignacion,
    BoEquipaje,
    BoPasaje,
    Vip,
    Redes,
    Rpm,
    Infinita,
    OwAjb,
    AtencionPersonal,
    Pmr,
    TasasChile,
    FuturosVuelos,
    Yq,
    ReembolsosParcial,
    ReembolsoTotal,
    Bonos,
    IncidenciaPagos,
    ServGastronomicos,
    Gerencia,
    SysInformes,
    Anac,
    Ebonos,
    Macros,
    Busqueda,
    Livechat,
    Incivia,
    Instrucciones,
    TrainEstandar,
    Abogados,
    Demandas,
    Aesa,
    Omics,
    PagosEsp,
    AsignacionIdioma,
    TramitacionIdioma,
    SudamericaAsign,
    SudamericaTram,
    ReembolsosJuridico,
    AviacionCivil,
    Adr,
    NormativaDot,
    TrainJuridico,
    Tec,
    // free-form counters
    Contar,
    Peticion,
    Vb,
}

impl AdminField {
    pub const ALL: [AdminField; 68] = [
        AdminField::Dni,
        AdminField::Email,
        AdminField::Tlf,
        AdminField::Login,
        AdminField::Extension,
        AdminField::Service,
        AdminField::Category,
        AdminField::Segment,
        AdminField::Language,
        AdminField::Antiguedad,
        AdminField::Tm,
        AdminField::Schedule,
        AdminField::Emea,
        AdminField::Ilt,
        AdminField::UserRed,
        AdminField::UserSitel,
        AdminField::UserSyr,
        AdminField::Salesforce,
        AdminField::Amadeus,
        AdminField::Resiber,
        AdminField::Callcenter,
        AdminField::Desktop,
        AdminField::Asignacion,
        AdminField::BoEquipaje,
        AdminField::BoPasaje,
        AdminField::Vip,
        AdminField::Redes,
        AdminField::Rpm,
        AdminField::Infinita,
        AdminField::OwAjb,
        AdminField::AtencionPersonal,
        AdminField::Pmr,
        AdminField::TasasChile,
        AdminField::FuturosVuelos,
        AdminField::Yq,
        AdminField::ReembolsosParcial,
        AdminField::ReembolsoTotal,
        AdminField::Bonos,
        AdminField::IncidenciaPagos,
        AdminField::ServGastronomicos,
        AdminField::Gerencia,
        AdminField::SysInformes,
        AdminField::Anac,
        AdminField::Ebonos,
        AdminField::Macros,
        AdminField::Busqueda,
        AdminField::Livechat,
        AdminField::Incivia,
        AdminField::Instrucciones,
        AdminField::TrainEstandar,
        AdminField::Abogados,
        AdminField::Demandas,
        AdminField::Aesa,
        AdminField::Omics,
        AdminField::PagosEsp,
        AdminField::AsignacionIdioma,
        AdminField::TramitacionIdioma,
        AdminField::SudamericaAsign,
        AdminField::SudamericaTram,
        AdminField::ReembolsosJuridico,
        AdminField::AviacionCivil,
        AdminField::Adr,
        AdminField::NormativaDot,
        AdminField::TrainJuridico,
        AdminField::Tec,
        AdminField::Contar,
        AdminField::Peticion,
        AdminField::Vb,
    ];

    pub fn kind(&self) -> AdminKind {
        use AdminField::*;
        match self {
            Segment => AdminKind::Segment,
            Salesforce => AdminKind::Salesforce,
            // Skill columns hold either a flag or the date the skill was granted.
            Antiguedad | Asignacion | BoEquipaje | BoPasaje | Vip | Redes | Rpm | Infinita
            | OwAjb | AtencionPersonal | Pmr | TasasChile | FuturosVuelos | Yq
            | ReembolsosParcial | ReembolsoTotal | Bonos | IncidenciaPagos | ServGastronomicos
            | Gerencia | SysInformes | Anac | Ebonos | Macros | Busqueda | Livechat | Incivia
            | Instrucciones | TrainEstandar | Abogados | Demandas | Aesa | Omics | PagosEsp
            | AsignacionIdioma | TramitacionIdioma | SudamericaAsign | SudamericaTram
            | ReembolsosJuridico | AviacionCivil | Adr | NormativaDot | TrainJuridico | Tec => {
                AdminKind::ExcelDate
            }
            _ => AdminKind::Plain,
        }
    }
}

/// Administrative snapshot: only attributes that carry a value are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(flatten)]
    pub fields: BTreeMap<AdminField, CellValue>,
    /// Attendance codes keyed by the `YYYYMMDD` header of their column.
    #[serde(rename = "dailyControl", default)]
    pub daily_control: BTreeMap<String, CellValue>,
}

impl Admin {
    pub fn get(&self, field: AdminField) -> Option<&CellValue> {
        self.fields.get(&field)
    }

    pub fn text(&self, field: AdminField) -> Option<String> {
        self.get(field).and_then(CellValue::as_text)
    }

    pub fn segment(&self) -> Option<Segment> {
        self.get(AdminField::Segment)
            .and_then(|v| crate::value::parse_segment(v))
    }
}

// =============================================================================
// FRAGMENTS
// =============================================================================

/// One normalized spreadsheet row, not yet merged with other sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub agent: String,
    pub id: Option<String>,
    pub supervisor: String,
    pub kpis: Kpis,
    pub admin: Admin,
    pub source: String,
    pub period: Period,
}

impl Fragment {
    /// Stamp provenance: the label and the period derived from it.
    pub fn tagged(mut self, label: &str) -> Self {
        self.source = label.to_string();
        self.period = extract_period(label);
        self
    }

    pub fn has_name(&self) -> bool {
        is_usable_name(&self.agent)
    }

    /// A fragment without ID and without name can never be clustered.
    pub fn is_identifiable(&self) -> bool {
        self.id.is_some() || self.has_name()
    }
}

pub fn is_usable_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != UNKNOWN_AGENT
}

// =============================================================================
// AGENTS
// =============================================================================

/// One KPI snapshot per distinct period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub period: Period,
    pub source: String,
    pub kpis: Kpis,
}

impl HistoryEntry {
    pub fn from_fragment(fragment: &Fragment) -> Self {
        HistoryEntry {
            period: fragment.period.clone(),
            source: fragment.source.clone(),
            kpis: fragment.kpis.clone(),
        }
    }
}

/// Consolidated record of one real agent.
///
/// On the wire the current KPIs appear twice, as `kpis` and as `metrics`;
/// either one is enough to read a record back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AgentRecord", into = "AgentRecord")]
pub struct Agent {
    pub id: Option<String>,
    pub agent: String,
    pub supervisor: String,
    pub kpis: Kpis,
    pub admin: Admin,
    pub history: Vec<HistoryEntry>,
    pub period: Period,
    pub source: String,
}

#[derive(Serialize, Deserialize)]
struct AgentRecord {
    id: Option<String>,
    agent: String,
    supervisor: String,
    #[serde(default)]
    kpis: Option<Kpis>,
    #[serde(default)]
    metrics: Option<Kpis>,
    #[serde(default)]
    admin: Admin,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(rename = "_period")]
    period: Period,
    #[serde(rename = "_source")]
    source: String,
}

impl From<AgentRecord> for Agent {
    fn from(record: AgentRecord) -> Self {
        Agent {
            id: record.id,
            agent: record.agent,
            supervisor: record.supervisor,
            kpis: record.kpis.or(record.metrics).unwrap_or_default(),
            admin: record.admin,
            history: record.history,
            period: record.period,
            source: record.source,
        }
    }
}

impl From<Agent> for AgentRecord {
    fn from(agent: Agent) -> Self {
        AgentRecord {
            id: agent.id,
            agent: agent.agent,
            supervisor: agent.supervisor,
            metrics: Some(agent.kpis.clone()),
            kpis: Some(agent.kpis),
            admin: agent.admin,
            history: agent.history,
            period: agent.period,
            source: agent.source,
        }
    }
}

impl Agent {
    /// Same as `kpis`.
    pub fn metrics(&self) -> &Kpis {
        &self.kpis
    }

    pub fn history_for(&self, period: &Period) -> Option<&HistoryEntry> {
        self.history.iter().find(|h| &h.period == period)
    }
}

impl From<&Fragment> for Agent {
    fn from(fragment: &Fragment) -> Self {
        Agent {
            id: fragment.id.clone(),
            agent: fragment.agent.clone(),
            supervisor: fragment.supervisor.clone(),
            kpis: fragment.kpis.clone(),
            admin: fragment.admin.clone(),
            history: vec![HistoryEntry::from_fragment(fragment)],
            period: fragment.period.clone(),
            source: fragment.source.clone(),
        }
    }
}
