//! Crawler coordinator - main crawl orchestration logic
//!
//! This module owns one crawl from start to finish:
//! - Opening storage and recording the run
//! - Seeding the frontier (seed URL plus any resumed snapshot)
//! - Starting the worker pool and the stats aggregator
//! - Detecting quiescence or an interrupt
//! - Draining workers and flushing the final report
//!
//! The lifecycle is `Idle -> Seeding -> Running -> Draining -> Terminated`;
//! every transition is checked, so `Terminated` is reached exactly once.

use crate::config::{compute_config_hash, CrawlConfig};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::Frontier;
use crate::crawler::worker::{run_worker, CrawlContext};
use crate::state::{CrawlPhase, Task, VisitedSet, WorkTracker};
use crate::stats::{spawn_aggregator, CrawlStats};
use crate::storage::{RunStatus, SqliteStorage, Storage, StorageError};
use crate::CrawlError;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use url::Url;

/// What a finished crawl reports back
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Id of the run record in storage
    pub run_id: i64,
    /// Final counters, taken after every worker stopped
    pub stats: CrawlStats,
    /// True when the crawl was stopped before the frontier drained
    pub interrupted: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<CrawlConfig>,
    storage: Arc<Mutex<SqliteStorage>>,
    phase: CrawlPhase,
    fresh: bool,
}

impl Coordinator {
    /// Creates a coordinator backed by the database named in the config
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage is open and structurally sound
    /// * `Err(CrawlError)` - The database could not be opened or is missing a table
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let storage = SqliteStorage::new(Path::new(&config.database_path))?;
        Ok(Self::with_storage(config, storage))
    }

    /// Creates a coordinator over an already opened store
    pub fn with_storage(config: CrawlConfig, storage: SqliteStorage) -> Self {
        Self {
            config: Arc::new(config),
            storage: Arc::new(Mutex::new(storage)),
            phase: CrawlPhase::Idle,
            fresh: false,
        }
    }

    /// Discards the resume snapshot of an earlier interrupted crawl
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Shared handle to the underlying store, e.g. for exporting results
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    fn transition(&mut self, to: CrawlPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(to) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!("Crawl phase: {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    fn storage_op<T>(
        &self,
        op: impl FnOnce(&mut SqliteStorage) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut storage = self.storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        op(&mut storage)
    }

    /// Runs the crawl until the frontier drains
    pub async fn run(&mut self) -> Result<CrawlSummary, CrawlError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the crawl until the frontier drains or `shutdown` resolves
    ///
    /// On shutdown no new task is started; tasks already being processed
    /// finish, the final stats are flushed and saved results stay in place.
    /// Tasks still queued remain in the snapshot for the next run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<CrawlSummary, CrawlError>
    where
        F: Future<Output = ()>,
    {
        self.transition(CrawlPhase::Seeding)?;

        let seed_url = self.config.seed_url.clone();
        let config_hash = compute_config_hash(&self.config);
        let fresh = self.fresh;
        let (run_id, resumed) = self.storage_op(|s| {
            if fresh {
                s.clear_snapshot()?;
            }
            // Anything spilled last time is also in the snapshot
            s.clear_spilled()?;
            let run_id = s.create_run(&config_hash, seed_url.as_str())?;
            Ok((run_id, s.load_snapshot()?))
        })?;

        tracing::info!(
            "Starting crawl run {} of {} (max depth {}, {} workers)",
            run_id,
            seed_url,
            self.config.max_depth,
            self.config.worker_count
        );

        let (stats, reporter) = spawn_aggregator(self.config.progress_interval);
        let ctx = Arc::new(CrawlContext {
            client: build_http_client(&self.config)?,
            config: Arc::clone(&self.config),
            frontier: Frontier::new(self.config.frontier_capacity),
            visited: VisitedSet::new(),
            tracker: WorkTracker::new(),
            storage: Arc::clone(&self.storage),
            stats,
            spilled: AtomicUsize::new(0),
        });

        // Workers start first so a resumed snapshot larger than the frontier cannot stall seeding
        let workers: Vec<_> = (0..self.config.worker_count)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&ctx))))
            .collect();

        // Held while seeding so an early finish of the seed cannot look like quiescence
        ctx.tracker.task_added();
        if let Err(e) = ctx.seed(Task::seed(seed_url)).await {
            tracing::debug!("Seed not queued: {}", e);
        }
        if !resumed.is_empty() {
            tracing::info!("Resuming {} queued URLs from the previous run", resumed.len());
        }
        for (url, depth) in resumed {
            match Url::parse(&url) {
                Ok(url) => {
                    if let Err(e) = ctx.seed(Task { url, depth }).await {
                        tracing::debug!("Resumed task not queued: {}", e);
                    }
                }
                Err(e) => tracing::warn!("Skipping unparsable snapshot URL {}: {}", url, e),
            }
        }

        self.transition(CrawlPhase::Running)?;
        ctx.tracker.task_finished();

        tokio::pin!(shutdown);
        let interrupted = tokio::select! {
            biased;
            _ = &mut shutdown => true,
            _ = ctx.tracker.wait_quiescent() => false,
        };

        self.transition(CrawlPhase::Draining)?;
        if interrupted {
            tracing::info!("Interrupt received, finishing in-flight pages");
        } else {
            tracing::info!("Frontier drained, shutting down workers");
        }

        ctx.frontier.close();
        let mut worker_error = None;
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("Worker task failed: {}", e);
                worker_error.get_or_insert(e);
            }
        }

        let final_stats = reporter.finish().await?;

        let status = if interrupted {
            RunStatus::Interrupted
        } else if worker_error.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.storage_op(|s| s.finish_run(run_id, status))?;
        self.transition(CrawlPhase::Terminated)?;

        if let Some(e) = worker_error {
            return Err(CrawlError::Worker(e));
        }

        Ok(CrawlSummary {
            run_id,
            stats: final_stats,
            interrupted,
        })
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl reached quiescence
/// * `Err(CrawlError)` - Crawl could not start or a worker panicked
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlSummary, CrawlError> {
    Coordinator::new(config)?.run().await
}
