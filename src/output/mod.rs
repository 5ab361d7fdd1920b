//! Output module for exporting crawl results
//!
//! Results are exported as a pretty-printed JSON array once the crawl has
//! terminated. Nothing here is called while workers are still writing.

mod json;

pub use json::{export_json, write_json};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize results: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
