//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CrawlResult, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Required table missing: {0}")]
    MissingTable(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Each method is its own transaction. Nothing links one call to the next,
/// so callers must not assume `is_visited` followed by `mark_visited` is
/// atomic.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Fingerprint of the effective configuration
    /// * `seed_url` - Where the run starts
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Records how a run ended, with a finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Visited Markers =====

    /// Point lookup: has this URL been processed?
    fn is_visited(&self, url: &str) -> StorageResult<bool>;

    /// Point upsert of a visited marker; marking twice is harmless
    fn mark_visited(&mut self, url: &str) -> StorageResult<()>;

    // ===== Results =====

    /// Saves a result, replacing any earlier result for the same URL
    fn save_result(&mut self, result: &CrawlResult) -> StorageResult<()>;

    /// Gets the result for a URL
    fn get_result(&self, url: &str) -> StorageResult<Option<CrawlResult>>;

    /// Full scan of all results, in no particular order
    ///
    /// Only meaningful once the crawl writing to this store has terminated.
    fn export_all(&self) -> StorageResult<Vec<CrawlResult>>;

    /// Counts stored results
    fn count_results(&self) -> StorageResult<u64>;

    // ===== Queue Snapshot =====

    /// Records a pending task; keeps the smallest depth seen for a URL
    fn snapshot_task(&mut self, url: &str, depth: u32) -> StorageResult<()>;

    /// Drops a task from the snapshot once it has been fully processed
    fn remove_snapshot_task(&mut self, url: &str) -> StorageResult<()>;

    /// Loads every pending task left behind by an earlier run
    fn load_snapshot(&self) -> StorageResult<Vec<(String, u32)>>;

    /// Clears the snapshot
    fn clear_snapshot(&mut self) -> StorageResult<()>;

    // ===== Spill =====

    /// Parks a task that did not fit in the in-memory frontier
    ///
    /// Unlike the snapshot, the same URL may be spilled more than once.
    fn spill_task(&mut self, url: &str, depth: u32) -> StorageResult<()>;

    /// Removes and returns up to `limit` spilled tasks, oldest first
    fn take_spilled(&mut self, limit: usize) -> StorageResult<Vec<(String, u32)>>;

    /// Drops every spilled task; a new run starts with an empty spill
    fn clear_spilled(&mut self) -> StorageResult<()>;
}
