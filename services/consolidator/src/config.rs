//! Runtime settings, read from the environment (and `.env` via dotenvy in
//! the binary).

use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = "./data/agents.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Blob store file holding the last saved agent list.
    pub store_path: PathBuf,
    /// Saved KPI overrides; defaults are used when unset or missing.
    pub kpi_config_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            store_path: PathBuf::from(
                lookup("STORE_PATH")
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
            ),
            kpi_config_path: lookup("KPI_CONFIG_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
