//! Consolidator - Merges call-center agent spreadsheets into one record per agent
//!
//! Responsibilities:
//! - Read heterogeneous KPI / admin / attendance exports (xlsx, xls, ods, csv)
//! - Detect columns from loosely named headers
//! - Normalize rows into typed fragments
//! - Resolve identities across files and keep a per-period KPI history
//! - Rank missed KPI targets for coaching
//! - Persist the last consolidated list as a JSON snapshot
//!
//! The pipeline (`value`, `columns`, `rows`, `period`, `merger`) is pure and
//! infallible; only the I/O collaborators return errors.

pub mod columns;
pub mod config;
pub mod demo;
pub mod error;
pub mod kpi;
pub mod merger;
pub mod model;
pub mod period;
pub mod reader;
pub mod rows;
pub mod store;
pub mod value;

pub use config::Settings;
pub use error::{ConsolidateError, ConsolidateResult};
pub use merger::{cluster, flatten, latest_snapshot, merge};
pub use model::{Admin, AdminField, Agent, Fragment, HistoryEntry, KpiKey, Kpis};
pub use period::{extract_period, Period};
pub use reader::{read_batch, read_workbook, BatchReport};
pub use rows::normalize;
pub use store::{AgentStore, BlobStore, FilterKey, Snapshot};
pub use value::{CellValue, RawRow, Segment, Sheets};
