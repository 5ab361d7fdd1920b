//! The stats actor
//!
//! A single tokio task owns the [`CrawlStats`] aggregate. Workers hold a
//! cheap [`StatsHandle`] and send events; the task applies them in arrival
//! order, logs a progress line on every tick and a summary on shutdown.

use crate::stats::{CrawlStats, StatsEvent};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

enum Message {
    Event(StatsEvent),
    Shutdown,
}

/// Sending side used by workers and the orchestrator
#[derive(Clone)]
pub struct StatsHandle {
    tx: UnboundedSender<Message>,
}

impl StatsHandle {
    /// Records an event; never blocks
    pub fn record(&self, event: StatsEvent) {
        // The aggregator only stops after every worker has been joined
        let _ = self.tx.send(Message::Event(event));
    }
}

/// Owner-side handle that stops the aggregator and collects the totals
pub struct StatsReporter {
    tx: UnboundedSender<Message>,
    join: JoinHandle<CrawlStats>,
}

impl StatsReporter {
    /// Signals shutdown and waits for the final snapshot
    ///
    /// Every event sent before this call is counted.
    pub async fn finish(self) -> Result<CrawlStats, JoinError> {
        let _ = self.tx.send(Message::Shutdown);
        self.join.await
    }
}

/// Starts the aggregator task
///
/// # Arguments
///
/// * `progress_interval` - Time between progress lines; must be non-zero
pub fn spawn_aggregator(progress_interval: Duration) -> (StatsHandle, StatsReporter) {
    let (tx, rx) = unbounded_channel();
    let join = tokio::spawn(run(rx, progress_interval));

    (
        StatsHandle { tx: tx.clone() },
        StatsReporter { tx, join },
    )
}

async fn run(mut rx: UnboundedReceiver<Message>, progress_interval: Duration) -> CrawlStats {
    let mut stats = CrawlStats::new();
    let mut ticker = interval_at(Instant::now() + progress_interval, progress_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(Message::Event(event)) => stats.apply(event),
                Some(Message::Shutdown) | None => break,
            },
            _ = ticker.tick() => {
                tracing::info!("{}", stats.progress_line());
            }
        }
    }

    tracing::info!("{}", stats.summary_line());
    tracing::debug!("Stats reporting stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_events_sent_before_finish() {
        let (handle, reporter) = spawn_aggregator(Duration::from_secs(60));

        handle.record(StatsEvent::Started);
        handle.record(StatsEvent::Crawled);
        handle.record(StatsEvent::Discovered);
        handle.record(StatsEvent::Discovered);
        handle.record(StatsEvent::Finished);
        handle.record(StatsEvent::QueueSize(4));

        let stats = reporter.finish().await.unwrap();
        assert_eq!(stats.crawled, 1);
        assert_eq!(stats.discovered, 2);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.queue_size, 4);
    }

    #[tokio::test]
    async fn test_many_concurrent_senders() {
        let (handle, reporter) = spawn_aggregator(Duration::from_millis(5));

        let senders: Vec<_> = (0..8)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    for _ in 0..100 {
                        handle.record(StatsEvent::Duplicate);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for sender in senders {
            sender.await.unwrap();
        }

        let stats = reporter.finish().await.unwrap();
        assert_eq!(stats.duplicates, 800);
    }

    #[tokio::test]
    async fn test_finish_with_no_events() {
        let (_handle, reporter) = spawn_aggregator(Duration::from_millis(10));
        let stats = reporter.finish().await.unwrap();
        assert_eq!(stats.crawled, 0);
    }
}
