//! Bounded frontier of pending crawl tasks
//!
//! A FIFO queue with two counting semaphores around it: `slots` holds one
//! permit per free place and `items` one permit per queued task. Enqueue
//! waits for a slot, dequeue waits for an item. Closing the frontier closes
//! both semaphores, which wakes every waiter.
//!
//! Workers never wait for a slot. They use [`Frontier::try_enqueue`] and
//! park whatever does not fit in storage, so a full frontier can never stop
//! its only consumers.

use crate::state::Task;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};

/// Returned by [`Frontier::enqueue`] once the frontier has been closed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Frontier is closed")]
pub struct FrontierClosed;

/// Why [`Frontier::try_enqueue`] handed the task back
#[derive(Debug)]
pub enum TryEnqueueError {
    Full(Task),
    Closed(Task),
}

/// Bounded multi-producer multi-consumer task queue
pub struct Frontier {
    queue: Mutex<VecDeque<Task>>,
    slots: Semaphore,
    items: Semaphore,
}

impl Frontier {
    /// Creates a frontier holding at most `capacity` tasks (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
        }
    }

    /// Adds a task, waiting while the frontier is full
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The task is queued
    /// * `Err(FrontierClosed)` - The frontier was closed before a slot freed up
    pub async fn enqueue(&self, task: Task) -> Result<(), FrontierClosed> {
        let slot = self.slots.acquire().await.map_err(|_| FrontierClosed)?;
        slot.forget();
        self.push(task);
        Ok(())
    }

    /// Adds a task only if a slot is free right now
    pub fn try_enqueue(&self, task: Task) -> Result<(), TryEnqueueError> {
        match self.slots.try_acquire() {
            Ok(slot) => slot.forget(),
            Err(TryAcquireError::NoPermits) => return Err(TryEnqueueError::Full(task)),
            Err(TryAcquireError::Closed) => return Err(TryEnqueueError::Closed(task)),
        }
        self.push(task);
        Ok(())
    }

    fn push(&self, task: Task) {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(task);
        self.items.add_permits(1);
    }

    /// Takes the oldest task, waiting while the frontier is empty
    ///
    /// Returns `None` once the frontier is closed.
    pub async fn dequeue(&self) -> Option<Task> {
        let item = self.items.acquire().await.ok()?;
        item.forget();

        let task = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        self.slots.add_permits(1);
        task
    }

    /// Closes the frontier; blocked and future calls return immediately
    pub fn close(&self) {
        self.slots.close();
        self.items.close();
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
