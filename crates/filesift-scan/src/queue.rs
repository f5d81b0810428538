//! Self-feeding work queue of directory tasks.
//!
//! Workers pop directories, scan them and push the subdirectories they find
//! back onto the same queue. Termination is decided by a pending counter,
//! not by the channel looking empty: a task is pending from the moment it
//! is pushed until its worker acknowledges it, and a worker acknowledges
//! only after pushing every child. Pending therefore reaches zero exactly
//! once, when the whole tree has been processed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};

use filesift_core::DirectoryTask;

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks enqueued
    pub enqueued: AtomicU64,

    /// Total tasks dequeued
    pub dequeued: AtomicU64,

    /// Total tasks acknowledged as done
    pub completed: AtomicU64,
}

impl QueueStats {
    /// Tasks pushed so far.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Tasks acknowledged so far.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    /// Enqueued plus in-flight tasks.
    pending: Mutex<usize>,
    drained: Condvar,
    stats: QueueStats,
}

/// Unbounded multi-producer multi-consumer queue with a drain point.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    sender: Sender<DirectoryTask>,
    receiver: Receiver<DirectoryTask>,
    state: Arc<QueueState>,
}

impl WorkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            state: Arc::new(QueueState::default()),
        }
    }

    /// Push a task. It counts as pending before it becomes visible to
    /// consumers.
    pub fn push(&self, task: DirectoryTask) {
        *self.lock_pending() += 1;
        // The receiver lives in `self`, so the channel cannot be disconnected.
        let _ = self.sender.send(task);
        self.state.stats.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Wait up to `timeout` for a task.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<DirectoryTask> {
        let task = self.receiver.recv_timeout(timeout).ok()?;
        self.state.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(task)
    }

    /// Take a task without waiting.
    pub fn try_pop(&self) -> Option<DirectoryTask> {
        let task = self.receiver.try_recv().ok()?;
        self.state.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(task)
    }

    /// Acknowledge one dequeued task. Must be called only after every
    /// subdirectory discovered by that task has been pushed.
    pub fn task_done(&self) {
        let mut pending = self.lock_pending();
        debug_assert!(*pending > 0, "task_done called more times than push");
        *pending = pending.saturating_sub(1);
        self.state.stats.completed.fetch_add(1, Ordering::Relaxed);
        if *pending == 0 {
            self.state.drained.notify_all();
        }
    }

    /// Guard that acknowledges one task when dropped.
    pub fn guard(&self) -> TaskGuard<'_> {
        TaskGuard { queue: self }
    }

    /// Block until no task is enqueued or in flight.
    pub fn drain(&self) {
        let pending = self.lock_pending();
        let _pending = self
            .state
            .drained
            .wait_while(pending, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until drained or `timeout` elapses. Returns whether drained.
    pub fn drain_timeout(&self, timeout: Duration) -> bool {
        let pending = self.lock_pending();
        let (pending, _) = self
            .state
            .drained
            .wait_timeout_while(pending, timeout, |pending| *pending > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *pending == 0
    }

    /// Whether no task is enqueued or in flight.
    pub fn is_drained(&self) -> bool {
        *self.lock_pending() == 0
    }

    /// Number of enqueued plus in-flight tasks.
    pub fn pending(&self) -> usize {
        *self.lock_pending()
    }

    /// Number of tasks waiting in the channel.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the channel currently holds no tasks. A queue can be empty
    /// while tasks are still in flight; see [`WorkQueue::is_drained`].
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Queue statistics.
    pub fn stats(&self) -> &QueueStats {
        &self.state.stats
    }

    fn lock_pending(&self) -> MutexGuard<'_, usize> {
        // The counter stays consistent even if a holder panicked.
        self.state
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII acknowledgement of one dequeued task.
///
/// Dropping the guard calls [`WorkQueue::task_done`], so a task is
/// acknowledged even when its worker unwinds.
#[must_use = "the task is acknowledged when the guard is dropped"]
pub struct TaskGuard<'a> {
    queue: &'a WorkQueue,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}
