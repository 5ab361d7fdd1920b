//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::{find_missing_table, initialize_schema};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlResult, RunRecord, RunStatus};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database, or it is structurally broken
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        Self::from_connection(conn)
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an open connection, creating and then verifying the schema
    pub fn from_connection(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        Self::verify(conn)
    }

    /// Wraps an open connection without touching its schema
    ///
    /// Fails if any required table is missing.
    pub fn verify(conn: Connection) -> StorageResult<Self> {
        if let Some(table) = find_missing_table(&conn)? {
            return Err(StorageError::MissingTable(table.to_string()));
        }
        Ok(Self { conn })
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        seed_url: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
    })
}

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlResult> {
    Ok(CrawlResult {
        url: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        keywords: row.get(3)?,
        timestamp: row.get(4)?,
        status: row.get(5)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, seed_url, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now_rfc3339(),
                config_hash,
                seed_url,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, seed_url, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now_rfc3339(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Visited Markers =====

    fn is_visited(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM visited WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn mark_visited(&mut self, url: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO visited (url, visited_at) VALUES (?1, ?2)",
            params![url, now_rfc3339()],
        )?;
        Ok(())
    }

    // ===== Results =====

    fn save_result(&mut self, result: &CrawlResult) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO results (url, title, description, keywords, crawled_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                keywords = excluded.keywords,
                crawled_at = excluded.crawled_at,
                status = excluded.status",
            params![
                result.url,
                result.title,
                result.description,
                result.keywords,
                result.timestamp,
                result.status
            ],
        )?;
        Ok(())
    }

    fn get_result(&self, url: &str) -> StorageResult<Option<CrawlResult>> {
        let result = self
            .conn
            .query_row(
                "SELECT url, title, description, keywords, crawled_at, status FROM results WHERE url = ?1",
                params![url],
                result_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn export_all(&self) -> StorageResult<Vec<CrawlResult>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, title, description, keywords, crawled_at, status FROM results")?;

        let results = stmt
            .query_map([], result_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(results)
    }

    fn count_results(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Queue Snapshot =====

    fn snapshot_task(&mut self, url: &str, depth: u32) -> StorageResult<()> {
        // On conflict keep the minimum depth
        self.conn.execute(
            "INSERT INTO queue (url, depth) VALUES (?1, ?2)
             ON CONFLICT(url) DO UPDATE SET depth = MIN(depth, excluded.depth)",
            params![url, depth],
        )?;
        Ok(())
    }

    fn remove_snapshot_task(&mut self, url: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM queue WHERE url = ?1", params![url])?;
        Ok(())
    }

    fn load_snapshot(&self) -> StorageResult<Vec<(String, u32)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, depth FROM queue ORDER BY depth ASC, url ASC")?;

        let tasks = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn clear_snapshot(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM queue", [])?;
        Ok(())
    }

    // ===== Spill =====

    fn spill_task(&mut self, url: &str, depth: u32) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO spill (url, depth) VALUES (?1, ?2)",
            params![url, depth],
        )?;
        Ok(())
    }

    fn take_spilled(&mut self, limit: usize) -> StorageResult<Vec<(String, u32)>> {
        let tx = self.conn.transaction()?;
        let tasks = {
            let mut stmt = tx.prepare("SELECT id, url, depth FROM spill ORDER BY id ASC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<(i64, String, u32)>, _>>()?;
            rows
        };
        if let Some((last_id, _, _)) = tasks.last() {
            tx.execute("DELETE FROM spill WHERE id <= ?1", params![last_id])?;
        }
        tx.commit()?;

        Ok(tasks.into_iter().map(|(_, url, depth)| (url, depth)).collect())
    }

    fn clear_spilled(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM spill", [])?;
        Ok(())
    }
}
