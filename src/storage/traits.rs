//! Result sink trait and error types

use crate::crawler::KeywordReport;
use crate::extract::{ExtractedContent, SearchResult};
use crate::storage::{KeywordRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur while writing or reading results
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for the output of a finished run
///
/// The crawler core never calls a sink; the binary writes the `RunOutput`
/// into one after the run and reads statistics back from it.
pub trait ResultSink {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Results =====

    /// Stores every keyword report with its search results
    fn record_reports(&mut self, run_id: i64, reports: &[KeywordReport]) -> StorageResult<()>;

    /// Stores extracted (or fallback) content records
    fn record_extracted(
        &mut self,
        run_id: i64,
        records: &[ExtractedContent],
    ) -> StorageResult<()>;

    /// Loads the search results of a run, keyword by keyword in position order
    fn get_results(&self, run_id: i64) -> StorageResult<Vec<SearchResult>>;

    /// Loads the extracted content records of a run in insertion order
    fn get_extracted(&self, run_id: i64) -> StorageResult<Vec<ExtractedContent>>;

    // ===== Statistics =====

    /// Per-keyword result counts and stop reasons of a run
    fn keyword_records(&self, run_id: i64) -> StorageResult<Vec<KeywordRecord>>;

    fn count_results(&self, run_id: i64) -> StorageResult<u64>;

    fn count_extracted(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts extracted records that carry fallback content
    fn count_fallbacks(&self, run_id: i64) -> StorageResult<u64>;
}
