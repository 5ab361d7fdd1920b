//! Crawl workers
//!
//! Every worker runs the same loop: take a task from the frontier, process
//! it, report it finished. Workers share the frontier, the in-memory visited
//! set, the work tracker, the storage handle and a stats handle, all through
//! one [`CrawlContext`]. No lock is held across network I/O.
//!
//! Workers are the frontier's only consumers, so they must never wait for a
//! free slot. A child task that does not fit is spilled to storage and
//! pulled back in by [`CrawlContext::refill`] before the next dequeue.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::frontier::{Frontier, FrontierClosed, TryEnqueueError};
use crate::crawler::parser::extract;
use crate::state::{Task, VisitedSet, WorkTracker};
use crate::stats::{StatsEvent, StatsHandle};
use crate::storage::{CrawlResult, SqliteStorage, Storage, StorageError, StorageResult};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// State shared by the orchestrator and all workers of one crawl
pub(crate) struct CrawlContext {
    pub config: Arc<CrawlConfig>,
    pub client: Client,
    pub frontier: Frontier,
    pub visited: VisitedSet,
    pub tracker: WorkTracker,
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub stats: StatsHandle,
    /// Tasks currently parked in the spill table; only changed under the storage lock
    pub spilled: AtomicUsize,
}

/// How a single task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskOutcome {
    Filtered,
    Duplicate,
    Failed,
    Crawled,
}

impl CrawlContext {
    /// Runs a storage operation under the storage lock
    ///
    /// The closure is synchronous, so the guard can never live across an
    /// `.await`.
    pub fn with_storage<T>(
        &self,
        op: impl FnOnce(&mut SqliteStorage) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut storage = self.storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        op(&mut storage)
    }

    /// Counts a task as outstanding and records it in the durable snapshot
    ///
    /// Must happen before the task becomes visible to any worker.
    fn admit(&self, task: &Task) {
        self.tracker.task_added();

        if let Err(e) = self.with_storage(|s| s.snapshot_task(task.url.as_str(), task.depth)) {
            tracing::warn!("Failed to snapshot {}: {}", task.url, e);
        }
    }

    fn discovered(&self) {
        self.stats.record(StatsEvent::Discovered);
        self.stats.record(StatsEvent::QueueSize(self.queued()));
    }

    /// Tasks waiting to be processed, in memory or spilled
    pub fn queued(&self) -> usize {
        self.frontier.len() + self.spilled.load(Ordering::SeqCst)
    }

    /// Puts a task on the frontier, waiting while it is full
    ///
    /// Only for callers that never dequeue themselves, i.e. the orchestrator.
    pub async fn seed(&self, task: Task) -> Result<(), FrontierClosed> {
        self.admit(&task);

        match self.frontier.enqueue(task).await {
            Ok(()) => {
                self.discovered();
                Ok(())
            }
            Err(closed) => {
                // Left in the snapshot so a later run picks it up
                self.tracker.task_finished();
                Err(closed)
            }
        }
    }

    /// Puts a task on the frontier without waiting; spills it when full
    pub fn schedule(&self, task: Task) -> Result<(), FrontierClosed> {
        self.admit(&task);

        match self.frontier.try_enqueue(task) {
            Ok(()) => {}
            Err(TryEnqueueError::Full(task)) => self.park(task),
            Err(TryEnqueueError::Closed(_)) => {
                self.tracker.task_finished();
                return Err(FrontierClosed);
            }
        }

        self.discovered();
        Ok(())
    }

    /// Moves a task that found the frontier full into the spill table
    fn park(&self, task: Task) {
        let parked = self.with_storage(|s| {
            s.spill_task(task.url.as_str(), task.depth)?;
            self.spilled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        if let Err(e) = parked {
            // Still in the snapshot, so the next run can pick it up
            tracing::warn!("Failed to spill {}, dropping it for this run: {}", task.url, e);
            self.tracker.task_finished();
        }
    }

    /// Pulls spilled tasks back into whatever room the frontier has
    pub fn refill(&self) {
        if self.spilled.load(Ordering::SeqCst) == 0 {
            return;
        }
        let room = self.frontier.available();
        if room == 0 {
            return;
        }

        let taken = self.with_storage(|s| {
            let tasks = s.take_spilled(room)?;
            self.spilled.fetch_sub(tasks.len(), Ordering::SeqCst);
            Ok(tasks)
        });
        let tasks = match taken {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!("Failed to read spilled tasks: {}", e);
                return;
            }
        };

        for (url, depth) in tasks {
            let url = match Url::parse(&url) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping unparsable spilled URL {}: {}", url, e);
                    self.tracker.task_finished();
                    continue;
                }
            };

            match self.frontier.try_enqueue(Task { url, depth }) {
                Ok(()) => {}
                Err(TryEnqueueError::Full(task)) => self.park(task),
                Err(TryEnqueueError::Closed(_)) => self.tracker.task_finished(),
            }
        }
    }
}

/// Worker loop; returns once the frontier is closed
pub(crate) async fn run_worker(id: usize, ctx: Arc<CrawlContext>) {
    tracing::debug!("Worker {} started", id);

    loop {
        ctx.refill();
        let task = match ctx.frontier.dequeue().await {
            Some(task) => task,
            None => break,
        };

        ctx.stats.record(StatsEvent::Started);
        ctx.stats.record(StatsEvent::QueueSize(ctx.queued()));

        let outcome = process_task(&ctx, &task).await;
        tracing::debug!("Worker {}: {} (depth {}) -> {:?}", id, task.url, task.depth, outcome);

        if let Err(e) = ctx.with_storage(|s| s.remove_snapshot_task(task.url.as_str())) {
            tracing::warn!("Failed to clear snapshot entry for {}: {}", task.url, e);
        }

        ctx.stats.record(StatsEvent::Finished);
        ctx.tracker.task_finished();

        if outcome == TaskOutcome::Crawled && !ctx.config.request_delay.is_zero() {
            tokio::time::sleep(ctx.config.request_delay).await;
        }
    }

    tracing::debug!("Worker {} stopped", id);
}

async fn process_task(ctx: &CrawlContext, task: &Task) -> TaskOutcome {
    if task.depth > ctx.config.max_depth {
        ctx.stats.record(StatsEvent::Filtered);
        return TaskOutcome::Filtered;
    }

    let key = task.url.as_str();

    // The claim is atomic, so two workers holding the same URL never both fetch it
    if !ctx.visited.claim(key) {
        ctx.stats.record(StatsEvent::Duplicate);
        return TaskOutcome::Duplicate;
    }

    match ctx.with_storage(|s| s.is_visited(key)) {
        Ok(true) => {
            ctx.stats.record(StatsEvent::Duplicate);
            return TaskOutcome::Duplicate;
        }
        Ok(false) => {}
        Err(e) => tracing::warn!("Visited lookup failed for {}: {}", key, e),
    }

    let (status_line, body) = match fetch_url(&ctx.client, &task.url).await {
        FetchResult::Success {
            final_url,
            status_line,
            body,
        } => {
            if final_url != task.url {
                tracing::debug!("{} redirected to {}", task.url, final_url);
            }
            (status_line, body)
        }
        FetchResult::HttpError { status_code } => {
            tracing::debug!("HTTP {} for {}", status_code, key);
            return fail(ctx, key);
        }
        FetchResult::NetworkError { error } => {
            tracing::debug!("Fetch failed for {}: {}", key, error);
            return fail(ctx, key);
        }
    };

    let page = match extract(&task.url, &body) {
        Ok(page) => page,
        Err(e) => {
            tracing::debug!("Extraction failed for {}: {}", key, e);
            return fail(ctx, key);
        }
    };

    let result = CrawlResult {
        url: key.to_string(),
        title: page.title,
        description: page.description,
        keywords: page.keywords,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        status: status_line,
    };

    if let Err(e) = ctx.with_storage(|s| s.mark_visited(key)) {
        tracing::warn!("Failed to mark {} visited: {}", key, e);
    }
    if let Err(e) = ctx.with_storage(|s| s.save_result(&result)) {
        tracing::warn!("Failed to save result for {}: {}", key, e);
    }
    ctx.stats.record(StatsEvent::Crawled);

    for link in page.links {
        if ctx.visited.contains(link.as_str()) {
            ctx.stats.record(StatsEvent::Duplicate);
            continue;
        }

        if ctx.schedule(task.child(link)).is_err() {
            tracing::debug!("Frontier closed, dropping remaining links of {}", key);
            break;
        }
    }

    TaskOutcome::Crawled
}

/// Counts a failed fetch and gives the URL back so a later rediscovery can retry
fn fail(ctx: &CrawlContext, key: &str) -> TaskOutcome {
    ctx.visited.release(key);
    ctx.stats.record(StatsEvent::Error);
    TaskOutcome::Failed
}
