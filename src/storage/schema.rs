//! Database schema for the result sink

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- How each keyword's pagination walk ended
CREATE TABLE IF NOT EXISTS keyword_reports (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    keyword TEXT NOT NULL,
    result_count INTEGER NOT NULL,
    pages_fetched INTEGER NOT NULL,
    stop_reason TEXT NOT NULL,
    PRIMARY KEY (run_id, keyword)
);

-- Search results in emission order per keyword
CREATE TABLE IF NOT EXISTS search_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    keyword TEXT NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    link TEXT NOT NULL,
    description TEXT NOT NULL
);

-- One record per search result, extracted or fallback
CREATE TABLE IF NOT EXISTS extracted_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    keyword TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    content TEXT NOT NULL,
    date TEXT NOT NULL,
    main_image TEXT NOT NULL,
    images TEXT NOT NULL,
    author TEXT NOT NULL,
    site TEXT NOT NULL,
    status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_results_run ON search_results(run_id, keyword);
CREATE INDEX IF NOT EXISTS idx_search_results_link ON search_results(link);
CREATE INDEX IF NOT EXISTS idx_extracted_run ON extracted_content(run_id, status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
