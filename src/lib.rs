//! Ripple-Crawl: a concurrent, resumable single-site crawler
//!
//! This crate crawls a web site from a seed URL, bounded by depth and host,
//! extracting page titles, metadata and links. Results and a durable
//! "visited" record are persisted so repeated runs do not reprocess pages.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod stats;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
///
/// Only structural problems surface here. Invalid depth, worker count or
/// delay values never do; they fall back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing seed URL")]
    MissingSeed,

    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Ripple-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{CrawlConfig, RawCrawlConfig};
pub use crawler::{run_crawl, Coordinator, CrawlSummary};
pub use state::{CrawlPhase, Task};
pub use stats::CrawlStats;
pub use storage::{CrawlResult, SqliteStorage, Storage};
pub use url::{extract_domain, same_domain};
