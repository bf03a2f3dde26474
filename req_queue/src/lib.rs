//! Multi-producer / multi-consumer request queue with a blocking,
//! notifying wait so idle workers sleep instead of spinning.
//!
//! Grounded on the teacher's `tokio::sync` based shared-state pattern
//! (`SessionCache`'s `parking_lot::Mutex`-guarded `VecDeque` plus a ring),
//! generalized here with `tokio::sync::Notify` for the blocking wait that
//! the session cache never needed (it is polled, never awaited).

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use corelib::Request;

/// Unbounded FIFO task source. `offer`/`poll` are total and non-blocking;
/// `await_or_poll` is the only suspension point, used by idle workers.
pub struct RequestQueue {
    items: Mutex<VecDeque<Request>>,
    notify: Notify,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Appends at the tail and wakes at least one waiting consumer.
    /// Concurrent `offer`s from the same producer are ordered by program
    /// order (the lock serializes them); across producers, arrival order
    /// at the lock determines pop order.
    pub fn offer(&self, request: Request) {
        self.items.lock().push_back(request);
        debug!("request enqueued");
        self.notify.notify_one();
    }

    /// Appends a whole batch atomically (used by the file ingester so a
    /// partially-parsed batch is never interleaved with other offers).
    pub fn offer_batch(&self, requests: impl IntoIterator<Item = Request>) {
        let mut guard = self.items.lock();
        let mut count = 0usize;
        for r in requests {
            guard.push_back(r);
            count += 1;
        }
        drop(guard);
        for _ in 0..count {
            self.notify.notify_one();
        }
    }

    /// Pops the head, non-blocking. `None` when empty.
    pub fn poll(&self) -> Option<Request> {
        self.items.lock().pop_front()
    }

    /// Pops the head if present; otherwise waits up to `timeout` for a
    /// wake-up and retries once. May still return `None`.
    pub async fn await_or_poll(&self, timeout: Duration) -> Option<Request> {
        if let Some(r) = self.poll() {
            return Some(r);
        }

        // Register for notification before re-checking so a wake-up that
        // lands between the fast-path poll and this point is not lost.
        let notified = self.notify.notified();
        tokio::pin!(notified);

        if let Some(r) = self.poll() {
            return Some(r);
        }

        let _ = tokio::time::timeout(timeout, notified).await;
        self.poll()
    }

    pub fn has_any(&self) -> bool {
        !self.items.lock().is_empty()
    }

    /// Ordered, read-only copy for the dashboard.
    pub fn snapshot(&self) -> Vec<Request> {
        self.items.lock().iter().cloned().collect()
    }
}
