//! Header detection for agent spreadsheets.
//!
//! Exports from different teams label the same column in many ways
//! ("GEST/H", "Exp gest/h", "Gestionado/h"). Each logical field is described
//! by one [`ColumnRule`] in [`RULES`]; a single matcher evaluates the table
//! against a sheet's header row. Nothing is required: a field that no header
//! matches is simply absent from the mapping.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{AdminField, KpiKey};

/// Identity columns: who the row is about and who manages them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    /// Strict name column (never an ID / code / user column).
    Name,
    Id,
    IdBoost,
    IdEmpl,
    /// Looser name column used when `Name` finds nothing.
    Agent,
    Supervisor,
}

/// Any logical field a header can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Identity(IdentityField),
    Kpi(KpiKey),
    Admin(AdminField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Header contains any include pattern and no exclude pattern.
    Substring,
    /// Header equals one of the include patterns. Used for short codes
    /// (VIP, RPM, YQ...) that would collide as substrings.
    Exact,
}

/// One row of the detection table. Patterns are lowercase.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: Field,
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
    pub mode: MatchMode,
}

impl ColumnRule {
    const fn contains(field: Field, include: &'static [&'static str]) -> Self {
        ColumnRule {
            field,
            include,
            exclude: &[],
            mode: MatchMode::Substring,
        }
    }

    const fn contains_except(
        field: Field,
        include: &'static [&'static str],
        exclude: &'static [&'static str],
    ) -> Self {
        ColumnRule {
            field,
            include,
            exclude,
            mode: MatchMode::Substring,
        }
    }

    const fn exact(field: Field, include: &'static [&'static str]) -> Self {
        ColumnRule {
            field,
            include,
            exclude: &[],
            mode: MatchMode::Exact,
        }
    }

    pub fn matches(&self, header: &str) -> bool {
        let normalized = header.trim().to_lowercase();
        match self.mode {
            MatchMode::Exact => self.include.iter().any(|p| normalized == *p),
            MatchMode::Substring => {
                self.include.iter().any(|p| normalized.contains(p))
                    && !self.exclude.iter().any(|e| normalized.contains(e))
            }
        }
    }

    /// First header, in sheet order, accepted by this rule.
    pub fn find<'a>(&self, headers: &[&'a str]) -> Option<&'a str> {
        headers.iter().copied().find(|h| self.matches(h))
    }
}

use Field::{Admin as A, Identity as I, Kpi as K};

/// The detection table. Vocabulary is the Spanish header set of the
/// call-center exports; order inside `include` does not matter.
pub static RULES: &[ColumnRule] = &[
    // --- identity ---------------------------------------------------------
    ColumnRule::contains_except(
        I(IdentityField::Name),
        &["nombre", "name", "agente"],
        &["usuario", "user", "id", "cod"],
    ),
    ColumnRule::contains(
        I(IdentityField::Id),
        &["id boost", "id_boost", "id_empl", "ficha", "id empleado", "login"],
    ),
    ColumnRule::contains(I(IdentityField::IdBoost), &["id boost", "id_boost"]),
    ColumnRule::contains(
        I(IdentityField::IdEmpl),
        &["id empleado", "id_empl", "id_empleado"],
    ),
    ColumnRule::contains_except(
        I(IdentityField::Agent),
        &["agente", "nombre", "name", "nombres y apellidos"],
        &["usuario", "user"],
    ),
    ColumnRule::contains(
        I(IdentityField::Supervisor),
        &["supervisor", "team", "tm", "gestor", "equipo", "responsable"],
    ),
    // --- admin: identity --------------------------------------------------
    ColumnRule::contains(A(AdminField::Dni), &["dni", "documento", "nif"]),
    ColumnRule::contains(A(AdminField::Email), &["email", "correo"]),
    ColumnRule::contains(A(AdminField::Tlf), &["tlf", "telefono", "movil"]),
    ColumnRule::exact(A(AdminField::Login), &["login"]),
    ColumnRule::contains(A(AdminField::Extension), &["extension", "ext"]),
    // --- admin: work info -------------------------------------------------
    ColumnRule::contains(A(AdminField::Service), &["servicio", "campaña"]),
    ColumnRule::contains_except(
        A(AdminField::Category),
        &["categoria", "puesto"],
        &["%", "score", "puntuacion", "objetivo", "target", "cumplimiento", "nota"],
    ),
    ColumnRule::contains(
        A(AdminField::Segment),
        &["segmento", "skill", "perfil", "tipo"],
    ),
    ColumnRule::contains(A(AdminField::Language), &["idioma", "language"]),
    ColumnRule::contains(
        A(AdminField::Antiguedad),
        &["antiguedad", "antigüedad", "fecha alta"],
    ),
    ColumnRule::contains(
        A(AdminField::Tm),
        &["tm", "team manager", "responsable", "gestor"],
    ),
    ColumnRule::contains(A(AdminField::Schedule), &["horario", "turno"]),
    ColumnRule::contains(A(AdminField::Emea), &["emea"]),
    ColumnRule::contains(A(AdminField::Ilt), &["ilt/mat/exc", "ilt", "baja"]),
    // --- admin: systems ---------------------------------------------------
    ColumnRule::contains(
        A(AdminField::UserRed),
        &["usuario red", "user red", "u_red"],
    ),
    ColumnRule::contains(A(AdminField::UserSitel), &["user sitel", "usuario sitel"]),
    ColumnRule::contains(
        A(AdminField::UserSyr),
        &["user syr", "usuario syr", "login syr", "user_syr"],
    ),
    ColumnRule::contains(A(AdminField::Amadeus), &["amadeus"]),
    ColumnRule::contains(A(AdminField::Resiber), &["resiber"]),
    ColumnRule::contains(A(AdminField::Callcenter), &["callcenter"]),
    ColumnRule::contains(A(AdminField::Desktop), &["desktop"]),
    // --- admin: skills / queues -------------------------------------------
    ColumnRule::contains(A(AdminField::Asignacion), &["asignacion", "asignación"]),
    ColumnRule::contains(A(AdminField::BoEquipaje), &["bo equipaje"]),
    ColumnRule::contains(A(AdminField::BoPasaje), &["bo pasaje"]),
    ColumnRule::exact(A(AdminField::Vip), &["vip"]),
    ColumnRule::contains(A(AdminField::Redes), &["redes/prensa", "redes", "prensa"]),
    ColumnRule::exact(A(AdminField::Rpm), &["rpm"]),
    ColumnRule::contains(A(AdminField::Infinita), &["infinita"]),
    ColumnRule::contains(A(AdminField::OwAjb), &["ow/ajb", "ow", "ajb"]),
    ColumnRule::contains(
        A(AdminField::AtencionPersonal),
        &["atencion personal", "atención personal"],
    ),
    ColumnRule::contains(A(AdminField::Pmr), &["pmr", "lesionados"]),
    ColumnRule::contains(A(AdminField::TasasChile), &["tasas chile"]),
    ColumnRule::contains(A(AdminField::FuturosVuelos), &["futuros vuelos"]),
    ColumnRule::exact(A(AdminField::Yq), &["yq"]),
    ColumnRule::contains(A(AdminField::ReembolsosParcial), &["reembolsos parcial"]),
    ColumnRule::contains(A(AdminField::ReembolsoTotal), &["reembolso total"]),
    ColumnRule::exact(A(AdminField::Bonos), &["bonos"]),
    ColumnRule::contains(A(AdminField::IncidenciaPagos), &["incidencia de pagos"]),
    ColumnRule::contains(A(AdminField::ServGastronomicos), &["serv gastronomicos"]),
    ColumnRule::contains(A(AdminField::Gerencia), &["gerencia"]),
    ColumnRule::contains(A(AdminField::SysInformes), &["sys informes"]),
    ColumnRule::contains(A(AdminField::Anac), &["anac"]),
    ColumnRule::contains(A(AdminField::Ebonos), &["ebonos"]),
    ColumnRule::contains(A(AdminField::Macros), &["macros"]),
    ColumnRule::contains(A(AdminField::Busqueda), &["equipo de busqueda"]),
    ColumnRule::contains(A(AdminField::Livechat), &["livechat"]),
    ColumnRule::contains(A(AdminField::Incivia), &["incivia"]),
    ColumnRule::contains(A(AdminField::Instrucciones), &["instrucciones"]),
    ColumnRule::contains(A(AdminField::TrainEstandar), &["train estandar"]),
    ColumnRule::contains(A(AdminField::Abogados), &["abogados"]),
    ColumnRule::contains(A(AdminField::Demandas), &["demandas"]),
    ColumnRule::exact(A(AdminField::Aesa), &["aesa"]),
    ColumnRule::exact(A(AdminField::Omics), &["omics"]),
    ColumnRule::contains(A(AdminField::PagosEsp), &["pagos españa"]),
    ColumnRule::contains(A(AdminField::AsignacionIdioma), &["asignacion idioma"]),
    ColumnRule::contains(A(AdminField::TramitacionIdioma), &["tramitacion idioma"]),
    // "asgnacion" is how the export spells it
    ColumnRule::contains(A(AdminField::SudamericaAsign), &["sudamerica asgnacion"]),
    ColumnRule::contains(A(AdminField::SudamericaTram), &["sudamerica tramitacion"]),
    ColumnRule::contains(A(AdminField::ReembolsosJuridico), &["reembolsos juridico"]),
    ColumnRule::contains(A(AdminField::AviacionCivil), &["aviacion civil"]),
    ColumnRule::exact(A(AdminField::Adr), &["adr"]),
    ColumnRule::contains(A(AdminField::NormativaDot), &["normativa dot"]),
    ColumnRule::contains(A(AdminField::TrainJuridico), &["train juridico"]),
    ColumnRule::exact(A(AdminField::Tec), &["tec"]),
    ColumnRule::exact(A(AdminField::Contar), &["contar"]),
    ColumnRule::exact(A(AdminField::Peticion), &["peticion"]),
    ColumnRule::exact(A(AdminField::Vb), &["vb"]),
    // --- KPIs -------------------------------------------------------------
    ColumnRule::contains_except(
        K(KpiKey::GestH),
        &["gestionado/h", "gest/h", "exp gest/h"],
        &["total"],
    ),
    ColumnRule::contains_except(
        K(KpiKey::CerrH),
        &["cerrado/h", "cerr/h", "exp cerr/h"],
        &["total"],
    ),
    ColumnRule::contains(
        K(KpiKey::NcoBo),
        &["nco est. bo", "nco bo", "cumplimiento bo"],
    ),
    ColumnRule::contains(
        K(KpiKey::NcoCall),
        &["nco est. llamadas", "nco llam", "nco call", "nco_llam"],
    ),
    ColumnRule::contains(
        K(KpiKey::GestTotal),
        &[
            "total expedientes gestionados",
            "exp. gest",
            "total gestiones",
            "gestionados",
            "expedientes gestionados",
            "gestiones",
        ],
    ),
    ColumnRule::contains(
        K(KpiKey::CerrTotal),
        &[
            "total expedientes cerrados",
            "exp. cerr",
            "total cerrados",
            "cerrados",
            "expedientes cerrados",
        ],
    ),
    ColumnRule::contains(
        K(KpiKey::Adherence),
        &["adherencia al puesto %", "adherencia"],
    ),
    ColumnRule::contains(K(KpiKey::Aht), &["aht", "tmo"]),
    ColumnRule::contains(K(KpiKey::Tipif), &["% tipificacion", "tipificación"]),
    ColumnRule::contains(K(KpiKey::Transfer), &["transfer rate", "transfer"]),
    ColumnRule::contains(K(KpiKey::Nps), &["nps"]),
    ColumnRule::contains(K(KpiKey::Ncp), &["ncp"]),
    ColumnRule::contains(K(KpiKey::Calls), &["llamadas", "calls"]),
];

static DAILY_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}$").expect("static regex"));

/// Literal header the reader assigns to blank header cells.
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Logical field -> header actually present in one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    columns: HashMap<Field, String>,
    /// Fallback columns scanned by content when no segment header exists.
    pub segment_candidates: Vec<String>,
    /// Every header that may hold a Salesforce user.
    pub salesforce_candidates: Vec<String>,
    /// `YYYYMMDD` attendance columns, in sheet order.
    pub daily_control: Vec<String>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    pub fn identity(&self, field: IdentityField) -> Option<&str> {
        self.get(Field::Identity(field))
    }

    pub fn kpi(&self, key: KpiKey) -> Option<&str> {
        self.get(Field::Kpi(key))
    }

    pub fn admin(&self, field: AdminField) -> Option<&str> {
        self.get(Field::Admin(field))
    }

    /// Number of fields that found a header.
    pub fn detected(&self) -> usize {
        self.columns.len()
    }
}

fn is_daily_header(header: &str) -> bool {
    DAILY_HEADER_RE.is_match(header.trim())
}

fn is_segment_candidate(header: &str, name_column: Option<&str>) -> bool {
    if header.contains(EMPTY_HEADER) {
        return true;
    }
    if is_daily_header(header) {
        return false;
    }
    let lower = header.to_lowercase();
    let skipped = [
        // training
        "train", "formacion", "curso",
        // comments
        "obs", "comentario", "nota",
        // dates
        "fecha", "date",
    ];
    if skipped.iter().any(|s| lower.contains(s)) {
        return false;
    }
    name_column != Some(header)
}

fn is_salesforce_candidate(header: &str) -> bool {
    let lower = header.to_lowercase();
    (lower.contains("salesforce") || lower.contains("sf"))
        && !["nivel", "level", "score"].iter().any(|s| lower.contains(s))
}

/// Build the column mapping for one sheet from its header keys.
pub fn detect_columns<'a, I>(headers: I) -> ColumnMapping
where
    I: IntoIterator<Item = &'a str>,
{
    let headers: Vec<&str> = headers.into_iter().collect();

    let columns: HashMap<Field, String> = RULES
        .iter()
        .filter_map(|rule| rule.find(&headers).map(|h| (rule.field, h.to_string())))
        .collect();

    let name_column = columns
        .get(&Field::Identity(IdentityField::Name))
        .map(String::as_str);

    ColumnMapping {
        segment_candidates: headers
            .iter()
            .filter(|h| is_segment_candidate(h, name_column))
            .map(|h| h.to_string())
            .collect(),
        salesforce_candidates: headers
            .iter()
            .filter(|h| is_salesforce_candidate(h))
            .map(|h| h.to_string())
            .collect(),
        daily_control: headers
            .iter()
            .filter(|h| is_daily_header(h))
            .map(|h| h.to_string())
            .collect(),
        columns,
    }
}
