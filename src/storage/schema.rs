//! Database schema definitions
//!
//! Independent collections back the crawl: visited markers, results, the
//! pending-queue snapshot and the frontier spill, plus a table of run records.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    seed_url TEXT NOT NULL,
    status TEXT NOT NULL
);

-- URLs that have been processed; only presence matters
CREATE TABLE IF NOT EXISTS visited (
    url TEXT PRIMARY KEY,
    visited_at TEXT NOT NULL
);

-- One result per successfully crawled URL
CREATE TABLE IF NOT EXISTS results (
    url TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '',
    crawled_at TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Tasks enqueued but not yet finished, for resuming an interrupted crawl
CREATE TABLE IF NOT EXISTS queue (
    url TEXT PRIMARY KEY,
    depth INTEGER NOT NULL
);

-- Overflow of the in-memory frontier, consumed oldest first
CREATE TABLE IF NOT EXISTS spill (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    depth INTEGER NOT NULL
);
"#;

/// Tables the crawler cannot run without
pub const REQUIRED_TABLES: &[&str] = &["runs", "visited", "results", "queue", "spill"];

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

/// Returns the first required table missing from the database, if any
///
/// Run once at startup; a store missing a collection is not usable at all.
pub fn find_missing_table(
    conn: &rusqlite::Connection,
) -> Result<Option<&'static str>, rusqlite::Error> {
    for &table in REQUIRED_TABLES {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Ok(Some(table));
        }
    }
    Ok(None)
}
