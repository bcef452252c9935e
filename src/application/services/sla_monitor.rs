//! # SLA Monitor
//!
//! Deadline tracking for aggregator hand-offs.
//!
//! Each hand-off arms a deadline; a confirmation callback cancels it.
//! [`SlaMonitor::due`] drains the deadlines that have passed, and
//! [`run_sweeper`] drives that drain on a fixed tick, routing every due
//! transaction into the dispatcher's expiry path.
//!
//! The heap keeps stale entries cheap: `cancel` only drops the armed
//! marker, and `due` discards heap entries whose marker is gone or no
//! longer matches. Arming is idempotent per transaction: re-arming an
//! already-armed transaction is a no-op, and only a `cancel` frees the
//! slot for a new deadline.

use crate::application::services::dispatcher::Dispatcher;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::TransactionId;
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DeadlineEntry {
    deadline: Timestamp,
    transaction_id: TransactionId,
}

#[derive(Debug, Default)]
struct MonitorState {
    heap: BinaryHeap<Reverse<DeadlineEntry>>,
    armed: HashMap<TransactionId, Timestamp>,
}

/// Tracks confirmation deadlines for in-flight aggregator hand-offs.
#[derive(Debug, Default)]
pub struct SlaMonitor {
    state: Mutex<MonitorState>,
}

impl SlaMonitor {
    /// Creates an empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a deadline for a transaction.
    ///
    /// Idempotent: arming an already-armed transaction is a no-op, so
    /// the earliest armed deadline always stands until it fires or is
    /// cancelled.
    pub fn arm(&self, transaction_id: TransactionId, deadline: Timestamp) {
        let mut state = self.state.lock();
        if state.armed.contains_key(&transaction_id) {
            return;
        }
        state.armed.insert(transaction_id, deadline);
        state.heap.push(Reverse(DeadlineEntry {
            deadline,
            transaction_id,
        }));
    }

    /// Cancels an armed deadline.
    ///
    /// Returns false if nothing was armed for the transaction. The heap
    /// entry is left behind and discarded lazily by [`SlaMonitor::due`].
    pub fn cancel(&self, transaction_id: &TransactionId) -> bool {
        let mut state = self.state.lock();
        state.armed.remove(transaction_id).is_some()
    }

    /// Returns true if a deadline is armed for the transaction.
    #[must_use]
    pub fn is_armed(&self, transaction_id: &TransactionId) -> bool {
        self.state.lock().armed.contains_key(transaction_id)
    }

    /// Returns the number of armed deadlines.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.state.lock().armed.len()
    }

    /// Drains the transactions whose deadline passed by `now`.
    ///
    /// Each drained transaction is disarmed, so a deadline fires at
    /// most once.
    pub fn due(&self, now: Timestamp) -> Vec<TransactionId> {
        let mut state = self.state.lock();
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = state.heap.peek() {
            if entry.deadline.is_after(&now) {
                break;
            }
            let entry = match state.heap.pop() {
                Some(Reverse(entry)) => entry,
                None => break,
            };
            // Stale entries: cancelled, already fired, or re-armed
            // after a cancel with a different deadline.
            if state.armed.get(&entry.transaction_id) == Some(&entry.deadline) {
                state.armed.remove(&entry.transaction_id);
                due.push(entry.transaction_id);
            }
        }
        due
    }
}

/// Periodically drains due deadlines into the dispatcher's expiry path.
///
/// Runs until the task is aborted; expiry failures are logged and do not
/// stop the sweep.
pub async fn run_sweeper(monitor: Arc<SlaMonitor>, dispatcher: Arc<Dispatcher>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        for transaction_id in monitor.due(Timestamp::now()) {
            if let Err(error) = dispatcher.handle_sla_expiry(&transaction_id).await {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    error = %error,
                    "SLA expiry handling failed"
                );
            }
        }
    }
}
