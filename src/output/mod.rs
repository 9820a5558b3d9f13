//! Output module for run reporting
//!
//! This module handles:
//! - Writing a finished run into a result sink
//! - Computing and printing run statistics

pub mod stats;

pub use stats::{
    load_latest_statistics, load_statistics, print_statistics, KeywordStatistics, RunStatistics,
};

use crate::crawler::RunOutput;
use crate::storage::ResultSink;
use crate::TrawlError;
use tracing::info;

/// Stores a finished run in a result sink
///
/// # Arguments
///
/// * `sink` - The sink to write into
/// * `config_hash` - Hash of the configuration the run used
/// * `output` - The run's reports and extracted records
///
/// # Returns
///
/// * `Ok(i64)` - ID of the stored run
/// * `Err(TrawlError)` - Writing to the sink failed
pub fn save_run(
    sink: &mut dyn ResultSink,
    config_hash: &str,
    output: &RunOutput,
) -> Result<i64, TrawlError> {
    let run_id = sink.create_run(config_hash)?;
    sink.record_reports(run_id, &output.reports)?;
    sink.record_extracted(run_id, &output.extracted)?;

    let status = stats::run_status(output);
    sink.finish_run(run_id, status)?;

    info!(
        "Stored run #{} ({} results, {} content records, {})",
        run_id,
        output.total_results(),
        output.extracted.len(),
        status.to_db_string()
    );
    Ok(run_id)
}
