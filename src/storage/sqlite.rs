//! SQLite result sink
//!
//! This module provides a SQLite-based implementation of the ResultSink trait.

use crate::crawler::KeywordReport;
use crate::extract::{ExtractedContent, ExtractionStatus, SearchResult};
use crate::state::StopReason;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ResultSink, StorageError, StorageResult};
use crate::storage::{KeywordRecord, RunRecord, RunStatus};
use crate::TrawlError;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Separator for the image list column
const IMAGE_SEPARATOR: &str = "\n";

/// SQLite result sink
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Creates a new SqliteSink instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(TrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, TrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, TrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn ensure_run(&self, run_id: i64) -> StorageResult<()> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM runs WHERE id = ?1", params![run_id], |_| Ok(()))
            .optional()?;
        exists.ok_or(StorageError::RunNotFound(run_id))
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<ExtractedContent> {
    let images: String = row.get(8)?;
    let status: String = row.get(10)?;
    let status = ExtractionStatus::from_db_string(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            10,
            Type::Text,
            format!("unknown extraction status '{}'", status).into(),
        )
    })?;

    Ok(ExtractedContent {
        keyword: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        date: row.get(5)?,
        main_image: row.get(6)?,
        author: row.get(7)?,
        images: images
            .split(IMAGE_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        site: row.get(9)?,
        status,
    })
}

impl ResultSink for SqliteSink {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Results =====

    fn record_reports(&mut self, run_id: i64, reports: &[KeywordReport]) -> StorageResult<()> {
        self.ensure_run(run_id)?;

        let tx = self.conn.transaction()?;
        {
            let mut report_stmt = tx.prepare(
                "INSERT OR REPLACE INTO keyword_reports
                 (run_id, keyword, result_count, pages_fetched, stop_reason)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let mut result_stmt = tx.prepare(
                "INSERT INTO search_results (run_id, keyword, position, title, link, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for report in reports {
                report_stmt.execute(params![
                    run_id,
                    report.keyword,
                    report.results.len() as i64,
                    report.pages_fetched,
                    report.stop_reason.to_db_string(),
                ])?;

                for (index, result) in report.results.iter().enumerate() {
                    result_stmt.execute(params![
                        run_id,
                        result.keyword,
                        index as i64 + 1,
                        result.title,
                        result.link,
                        result.description,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_extracted(
        &mut self,
        run_id: i64,
        records: &[ExtractedContent],
    ) -> StorageResult<()> {
        self.ensure_run(run_id)?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO extracted_content
                 (run_id, keyword, url, title, description, content, date, main_image,
                  author, images, site, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for record in records {
                stmt.execute(params![
                    run_id,
                    record.keyword,
                    record.url,
                    record.title,
                    record.description,
                    record.content,
                    record.date,
                    record.main_image,
                    record.author,
                    record.images.join(IMAGE_SEPARATOR),
                    record.site,
                    record.status.to_db_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get_results(&self, run_id: i64) -> StorageResult<Vec<SearchResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, title, link, description FROM search_results
             WHERE run_id = ?1 ORDER BY id",
        )?;

        let results = stmt
            .query_map(params![run_id], |row| {
                Ok(SearchResult {
                    keyword: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                    description: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn get_extracted(&self, run_id: i64) -> StorageResult<Vec<ExtractedContent>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, url, title, description, content, date, main_image, author,
                    images, site, status
             FROM extracted_content WHERE run_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![run_id], content_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Statistics =====

    fn keyword_records(&self, run_id: i64) -> StorageResult<Vec<KeywordRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT keyword, result_count, pages_fetched, stop_reason FROM keyword_reports
             WHERE run_id = ?1 ORDER BY rowid",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                let result_count: i64 = row.get(1)?;
                let stop_reason: String = row.get(3)?;
                Ok(KeywordRecord {
                    keyword: row.get(0)?,
                    result_count: result_count as u64,
                    pages_fetched: row.get(2)?,
                    stop_reason: StopReason::from_db_string(&stop_reason),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_results(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM search_results WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_extracted(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM extracted_content WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_fallbacks(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM extracted_content WHERE run_id = ?1 AND status = ?2",
            params![run_id, ExtractionStatus::Fallback.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
