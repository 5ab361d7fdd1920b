use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts outstanding tasks and signals the moment the crawl goes quiet
///
/// A task is outstanding from the moment it is enqueued until its processing
/// has finished, including any child tasks it enqueued along the way. Since
/// children are counted before their parent is released, the counter can
/// only reach zero when no task is queued and none is being processed.
/// The zero crossing fires the quiescence signal exactly once.
#[derive(Debug, Default)]
pub struct WorkTracker {
    outstanding: AtomicUsize,
    quiescent: AtomicBool,
    notify: Notify,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called before the task becomes visible on the frontier
    pub fn task_added(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Called once per added task when it is completely done
    pub fn task_finished(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "task_finished without matching task_added");

        if previous == 1 && !self.quiescent.swap(true, Ordering::SeqCst) {
            // notify_one stores a permit, so a waiter that arrives late still wakes
            self.notify.notify_one();
        }
    }

    /// Resolves once the outstanding count has dropped to zero
    pub async fn wait_quiescent(&self) {
        if self.is_quiescent() {
            return;
        }
        self.notify.notified().await;
    }

    pub fn is_quiescent(&self) -> bool {
        self.quiescent.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}
