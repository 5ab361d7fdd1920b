//! Crawl statistics
//!
//! Counters are owned by a single aggregator task (see [`aggregator`]).
//! Everyone else only sends [`StatsEvent`]s, so no counter is ever shared
//! between threads and none needs a lock.

mod aggregator;

pub use aggregator::{spawn_aggregator, StatsHandle, StatsReporter};

use std::time::{Duration, Instant};

/// One counted transition in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    /// A page was fetched, parsed and saved
    Crawled,
    /// A new task was put on the frontier
    Discovered,
    /// A URL was skipped because it was already visited
    Duplicate,
    /// A task was dropped by the depth bound
    Filtered,
    /// A worker picked up a task
    Started,
    /// A worker finished a task, whatever the outcome
    Finished,
    /// A fetch or extraction failed
    Error,
    /// Latest observed frontier length
    QueueSize(usize),
}

/// Snapshot of the crawl counters
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub crawled: u64,
    pub discovered: u64,
    pub duplicates: u64,
    pub filtered: u64,
    pub errors: u64,
    pub in_progress: u64,
    pub queue_size: usize,
    pub started_at: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            crawled: 0,
            discovered: 0,
            duplicates: 0,
            filtered: 0,
            errors: 0,
            in_progress: 0,
            queue_size: 0,
            started_at: Instant::now(),
        }
    }

    /// Applies exactly one counter mutation
    pub fn apply(&mut self, event: StatsEvent) {
        match event {
            StatsEvent::Crawled => self.crawled += 1,
            StatsEvent::Discovered => self.discovered += 1,
            StatsEvent::Duplicate => self.duplicates += 1,
            StatsEvent::Filtered => self.filtered += 1,
            StatsEvent::Started => self.in_progress += 1,
            StatsEvent::Finished => self.in_progress = self.in_progress.saturating_sub(1),
            StatsEvent::Error => self.errors += 1,
            StatsEvent::QueueSize(size) => self.queue_size = size,
        }
    }

    /// Wall time since the crawl started, truncated to whole seconds
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.started_at.elapsed().as_secs())
    }

    /// One-line progress report
    pub fn progress_line(&self) -> String {
        format!(
            "[CRAWL] Processing: {} | Queue: {} | Crawled: {} | Found: {} | Errors: {} | Time: {:?}",
            self.in_progress,
            self.queue_size,
            self.crawled,
            self.discovered,
            self.errors,
            self.elapsed()
        )
    }

    /// Final summary line
    pub fn summary_line(&self) -> String {
        format!(
            "Crawl complete: {} crawled, {} discovered, {} duplicates skipped, {} filtered, {} errors in {:?}",
            self.crawled,
            self.discovered,
            self.duplicates,
            self.filtered,
            self.errors,
            self.elapsed()
        )
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}
