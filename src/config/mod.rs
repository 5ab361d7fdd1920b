//! Configuration module for Ripple-Crawl
//!
//! This module turns loosely-typed input (CLI flags, TOML files) into an
//! immutable [`CrawlConfig`]. Invalid depth, worker, delay and capacity
//! values never fail; they fall back to documented defaults.
//!
//! # Example
//!
//! ```
//! use ripple_crawl::config::{CrawlConfig, RawCrawlConfig};
//!
//! let raw = RawCrawlConfig {
//!     seed_url: Some("https://example.com/".to_string()),
//!     depth: Some("not-a-number".to_string()),
//!     ..Default::default()
//! };
//! let config = CrawlConfig::from_raw(raw).unwrap();
//! assert_eq!(config.max_depth, 2);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, RawCrawlConfig, DEFAULT_DATABASE_PATH, DEFAULT_FRONTIER_CAPACITY,
    DEFAULT_MAX_DEPTH, DEFAULT_PROGRESS_INTERVAL, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WORKER_COUNT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_raw_config};
pub use validation::parse_duration;
