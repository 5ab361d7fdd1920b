//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - HTML parsing and link extraction
//! - The bounded frontier shared by the worker pool
//! - Overall crawl coordination and termination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlSummary};
pub use fetcher::{build_http_client, fetch_url, status_line, FetchResult};
pub use frontier::{Frontier, FrontierClosed, TryEnqueueError};
pub use parser::{extract, ExtractError, ExtractedPage};
