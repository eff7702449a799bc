//! Holding and persisting the consolidated agent list.
//!
//! [`AgentStore`] is the in-memory view consumers read from, with the
//! supervisor / segment filters. [`BlobStore`] keeps the last known good
//! agent list on disk as a single JSON snapshot; every save replaces the
//! previous one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::error::ConsolidateResult;
use crate::model::Agent;

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Supervisor,
    Segment,
}

/// Active filters; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFilters {
    pub supervisor: Option<String>,
    pub segment: Option<String>,
}

impl AgentFilters {
    fn accepts(&self, agent: &Agent) -> bool {
        if let Some(tm) = &self.supervisor {
            if agent.supervisor != *tm {
                return false;
            }
        }
        if let Some(segment) = &self.segment {
            let wanted = segment.trim();
            let actual = agent
                .admin
                .segment()
                .map(|s| s.as_str().to_string())
                .or_else(|| agent.admin.text(crate::model::AdminField::Segment));
            if !actual.is_some_and(|a| a.eq_ignore_ascii_case(wanted)) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct AgentStore {
    agents: Vec<Agent>,
    filters: AgentFilters,
    last_updated: Option<DateTime<Utc>>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, agents: Vec<Agent>) {
        tracing::debug!(agents = agents.len(), "store data replaced");
        self.agents = agents;
        self.last_updated = Some(Utc::now());
    }

    /// Agents passing the active filters.
    pub fn data(&self) -> Vec<&Agent> {
        self.agents
            .iter()
            .filter(|a| self.filters.accepts(a))
            .collect()
    }

    pub fn all_data(&self) -> &[Agent] {
        &self.agents
    }

    /// Set or clear (`None`) one filter.
    pub fn set_filter(&mut self, key: FilterKey, value: Option<String>) {
        let value = value.filter(|v| !v.trim().is_empty() && v != "all");
        match key {
            FilterKey::Supervisor => self.filters.supervisor = value,
            FilterKey::Segment => self.filters.segment = value,
        }
    }

    pub fn filters(&self) -> &AgentFilters {
        &self.filters
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Distinct supervisors, sorted, for selectors.
    pub fn supervisors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.iter().map(|a| a.supervisor.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Find by ID (case-insensitive) or by exact trimmed name.
    pub fn find(&self, needle: &str) -> Option<&Agent> {
        let needle = needle.trim();
        self.agents
            .iter()
            .find(|a| a.id.as_deref().is_some_and(|id| id.trim().eq_ignore_ascii_case(needle)))
            .or_else(|| {
                self.agents
                    .iter()
                    .find(|a| a.agent.trim().eq_ignore_ascii_case(needle))
            })
    }
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// On-disk blob: the agent list plus when and as what it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub agents: Vec<Agent>,
}

/// Last-write-wins JSON file. No schema migrations.
#[derive(Debug, Clone)]
pub struct BlobStore {
    path: PathBuf,
}

impl BlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        BlobStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replace the stored list. Written to a sibling temp file first and
    /// renamed over the target.
    pub async fn save(&self, agents: &[Agent]) -> ConsolidateResult<Snapshot> {
        let snapshot = Snapshot {
            snapshot_id: Uuid::new_v4(),
            saved_at: Utc::now(),
            agents: agents.to_vec(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?).await?;
        fs::rename(&tmp, &self.path).await?;

        tracing::info!(
            path = %self.path.display(),
            snapshot_id = %snapshot.snapshot_id,
            agents = snapshot.agents.len(),
            "snapshot saved"
        );
        Ok(snapshot)
    }

    /// Full snapshot, `None` when nothing was saved yet.
    pub async fn load_snapshot(&self) -> ConsolidateResult<Option<Snapshot>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Stored agents; empty when nothing was saved yet.
    pub async fn load(&self) -> ConsolidateResult<Vec<Agent>> {
        Ok(self
            .load_snapshot()
            .await?
            .map(|s| s.agents)
            .unwrap_or_default())
    }

    pub async fn clear(&self) -> ConsolidateResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "store cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdminField, Fragment, KpiKey, Kpis, UNASSIGNED_SUPERVISOR};
    use crate::period::Period;
    use crate::value::CellValue;

    fn agent(name: &str, id: Option<&str>, supervisor: &str, segment: Option<&str>) -> Agent {
        let mut fragment = Fragment {
            agent: name.to_string(),
            id: id.map(str::to_string),
            supervisor: supervisor.to_string(),
            kpis: [(KpiKey::GestH, 2.0)].into_iter().collect::<Kpis>(),
            admin: Default::default(),
            source: String::new(),
            period: Period::default(),
        }
        .tagged("KPI_2025_12.xlsx");
        if let Some(segment) = segment {
            fragment
                .admin
                .fields
                .insert(AdminField::Segment, CellValue::from(segment));
        }
        Agent::from(&fragment)
    }

    fn sample() -> Vec<Agent> {
        vec![
            agent("Ana", Some("A1"), "TEAM A", Some("JURIDICO")),
            agent("Bea", Some("B1"), "TEAM B", Some("ESTANDAR")),
            agent("Carla", None, "TEAM A", Some("ESTANDAR")),
            agent("Dani", None, UNASSIGNED_SUPERVISOR, None),
        ]
    }

    // -------------------------------------------------------------------------
    // AgentStore
    // -------------------------------------------------------------------------

    #[test]
    fn test_store_filters() {
        let mut store = AgentStore::new();
        assert!(store.last_updated().is_none());
        store.set_data(sample());
        assert!(store.last_updated().is_some());
        assert_eq!(store.data().len(), 4);

        store.set_filter(FilterKey::Supervisor, Some("TEAM A".to_string()));
        let names: Vec<&str> = store.data().iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Carla"]);

        store.set_filter(FilterKey::Segment, Some("estandar".to_string()));
        let names: Vec<&str> = store.data().iter().map(|a| a.agent.as_str()).collect();
        assert_eq!(names, vec!["Carla"]);

        store.set_filter(FilterKey::Supervisor, Some("all".to_string()));
        store.set_filter(FilterKey::Segment, None);
        assert_eq!(store.data().len(), 4);
        assert_eq!(store.all_data().len(), 4);
        assert_eq!(store.filters(), &AgentFilters::default());
    }

    #[test]
    fn test_store_find_and_supervisors() {
        let mut store = AgentStore::new();
        store.set_data(sample());
        assert_eq!(store.find("a1").map(|a| a.agent.as_str()), Some("Ana"));
        assert_eq!(store.find(" carla ").map(|a| a.agent.as_str()), Some("Carla"));
        assert!(store.find("nobody").is_none());
        assert_eq!(
            store.supervisors(),
            vec![UNASSIGNED_SUPERVISOR, "TEAM A", "TEAM B"]
        );
    }

    // -------------------------------------------------------------------------
    // BlobStore
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_blob_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("agents.json"));
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.load_snapshot().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_blob_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("data").join("agents.json"));
        let agents = sample();

        let first = store.save(&agents).await.unwrap();
        let second = store.save(&agents[..1]).await.unwrap();
        assert_ne!(first.snapshot_id, second.snapshot_id);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, agents[..1].to_vec());
        assert!(!dir.path().join("data").join("agents.json.tmp").exists());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blob_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("agents.json"));
        store.save(&sample()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["snapshotId"].is_string());
        assert!(json["savedAt"].is_string());
        let first = &json["agents"][0];
        assert_eq!(first["agent"], "Ana");
        assert_eq!(first["_period"], "2025-12");
        assert_eq!(first["_source"], "KPI_2025_12.xlsx");
        assert_eq!(first["kpis"]["gestH"], 2.0);
        assert_eq!(first["admin"]["segment"], "JURIDICO");
        assert_eq!(first["history"][0]["period"], "2025-12");
    }

    #[tokio::test]
    async fn test_blob_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(BlobStore::new(path).load().await.is_err());
    }
}
