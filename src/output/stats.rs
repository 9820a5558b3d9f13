//! Run statistics
//!
//! Statistics are computed either straight from an in-memory `RunOutput`
//! or from a run stored in a result sink.

use crate::crawler::RunOutput;
use crate::state::StopReason;
use crate::storage::{ResultSink, RunRecord, RunStatus};
use crate::TrawlError;
use chrono::{DateTime, Utc};

/// Result counts of one keyword
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordStatistics {
    pub keyword: String,
    pub results: u64,
    pub pages_fetched: u32,

    /// None if the stored reason is unknown
    pub stop_reason: Option<StopReason>,
}

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Stored run ID; None for statistics of an unsaved run
    pub run_id: Option<i64>,

    /// Stored run status ("running", "completed", "cancelled")
    pub status: Option<String>,

    /// Wall-clock duration of a finished stored run
    pub duration_seconds: Option<u64>,

    /// Total number of search results emitted
    pub total_results: u64,

    /// Total number of content records, fallbacks included
    pub total_extracted: u64,

    /// Content records that carry fallback content
    pub fallbacks: u64,

    /// Per-keyword counts, in input order
    pub keywords: Vec<KeywordStatistics>,
}

impl RunStatistics {
    /// Computes statistics from the output of a run that just finished
    pub fn from_run_output(output: &RunOutput) -> Self {
        let keywords = output
            .reports
            .iter()
            .map(|report| KeywordStatistics {
                keyword: report.keyword.clone(),
                results: report.results.len() as u64,
                pages_fetched: report.pages_fetched,
                stop_reason: Some(report.stop_reason),
            })
            .collect();

        Self {
            run_id: None,
            status: Some(run_status(output).to_db_string().to_string()),
            duration_seconds: None,
            total_results: output.total_results() as u64,
            total_extracted: output.extracted.len() as u64,
            fallbacks: output.extracted.iter().filter(|r| r.is_fallback()).count() as u64,
            keywords,
        }
    }

    /// Share of content records that are fallbacks, in percent
    pub fn fallback_rate(&self) -> f64 {
        if self.total_extracted == 0 {
            0.0
        } else {
            (self.fallbacks as f64 / self.total_extracted as f64) * 100.0
        }
    }
}

/// Loads statistics of a stored run
///
/// # Arguments
///
/// * `sink` - The result sink to query
/// * `run_id` - The run to summarize
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(TrawlError)` - The run does not exist or a query failed
pub fn load_statistics(sink: &dyn ResultSink, run_id: i64) -> Result<RunStatistics, TrawlError> {
    let run = sink.get_run(run_id)?;

    let keywords = sink
        .keyword_records(run_id)?
        .into_iter()
        .map(|record| KeywordStatistics {
            keyword: record.keyword,
            results: record.result_count,
            pages_fetched: record.pages_fetched,
            stop_reason: record.stop_reason,
        })
        .collect();

    Ok(RunStatistics {
        run_id: Some(run.id),
        status: Some(run.status.to_db_string().to_string()),
        duration_seconds: run_duration(&run),
        total_results: sink.count_results(run_id)?,
        total_extracted: sink.count_extracted(run_id)?,
        fallbacks: sink.count_fallbacks(run_id)?,
        keywords,
    })
}

/// Loads statistics of the most recent stored run, if any
pub fn load_latest_statistics(sink: &dyn ResultSink) -> Result<Option<RunStatistics>, TrawlError> {
    match sink.get_latest_run()? {
        Some(run) => load_statistics(sink, run.id).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn run_status(output: &RunOutput) -> RunStatus {
    if output.cancelled {
        RunStatus::Cancelled
    } else {
        RunStatus::Completed
    }
}

fn run_duration(run: &RunRecord) -> Option<u64> {
    let started = run.started_at.parse::<DateTime<Utc>>().ok()?;
    let finished = run.finished_at.as_deref()?.parse::<DateTime<Utc>>().ok()?;
    Some((finished - started).num_seconds().max(0) as u64)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    if let Some(run_id) = stats.run_id {
        println!("Run #{}", run_id);
    }
    if let Some(status) = &stats.status {
        println!("  Status: {}", status);
    }
    if let Some(duration) = stats.duration_seconds {
        println!("  Duration: {}s", duration);
    }

    println!("Overview:");
    println!("  Keywords: {}", stats.keywords.len());
    println!("  Search results: {}", stats.total_results);
    println!("  Content records: {}", stats.total_extracted);
    println!(
        "  Fallbacks: {} ({:.1}%)",
        stats.fallbacks,
        stats.fallback_rate()
    );
    println!();

    if !stats.keywords.is_empty() {
        println!("Per Keyword:");
        let width = stats
            .keywords
            .iter()
            .map(|k| k.keyword.chars().count())
            .max()
            .unwrap_or(0);

        for keyword in &stats.keywords {
            let reason = keyword
                .stop_reason
                .map(|r| r.to_db_string())
                .unwrap_or("unknown");
            println!(
                "  {:<width$}  {:>4} results  {:>3} pages  {}",
                keyword.keyword,
                keyword.results,
                keyword.pages_fetched,
                reason,
                width = width
            );
        }
        println!();
    }
}
