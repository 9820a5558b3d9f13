//! Storage module for persisting run output
//!
//! This module handles all database operations of the result sink:
//! - SQLite database initialization and schema management
//! - Run tracking with a config hash and final status
//! - Keyword reports, search results and extracted content

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteSink;
pub use traits::{ResultSink, StorageError, StorageResult};

use crate::state::StopReason;
use crate::TrawlError;

use std::path::Path;

/// Initializes or opens a result database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteSink)` - Successfully initialized sink
/// * `Err(TrawlError)` - Failed to open or initialize the database
pub fn open_sink(path: &Path) -> Result<SqliteSink, TrawlError> {
    SqliteSink::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Stored summary of one keyword's walk
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRecord {
    pub keyword: String,
    pub result_count: u64,
    pub pages_fetched: u32,

    /// None if the stored reason is not recognized
    pub stop_reason: Option<StopReason>,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Cancelled] {
            let db_str = status.to_db_string();
            let parsed = RunStatus::from_db_string(db_str);
            assert_eq!(Some(*status), parsed);
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("interrupted"), None);
    }
}
