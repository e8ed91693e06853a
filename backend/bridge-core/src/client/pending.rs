//! Request/response correlation for the client gateway.
//!
//! Every invoke registers a oneshot here under a fresh correlation id;
//! the frame router completes entries as responses arrive, in whatever
//! order the host finishes them. Matching is by id, never by arrival
//! order, so overlapping invokes on one channel cannot cross-resolve.

use crate::wire::Outcome;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use tokio::sync::{Mutex, oneshot};

/// In-flight invoke table.
pub(crate) struct PendingInvokes {
    /// Correlation ids start at 1; the host reserves 0 for faults it
    /// cannot correlate.
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, oneshot::Sender<Outcome>>>,
}

impl PendingInvokes {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a correlation id and the receiver its response will
    /// arrive on.
    pub(crate) async fn register(&self) -> (u64, oneshot::Receiver<Outcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.entries.lock().await.insert(id, sender);
        (id, receiver)
    }

    /// Drop a registration whose request never made it onto the wire.
    pub(crate) async fn abandon(&self, id: u64) {
        self.entries.lock().await.remove(&id);
    }

    /// Deliver the single response for `id`.
    ///
    /// A missing entry means the caller abandoned the invoke (or the host
    /// sent an uncorrelated fault); the response is dropped - the host-side
    /// effect may still have happened (at-most-once, no cancellation
    /// propagation).
    pub(crate) async fn complete(&self, id: u64, outcome: Outcome) {
        let sender = self.entries.lock().await.remove(&id);
        match sender {
            Some(sender) => {
                if sender.send(outcome).is_err() {
                    debug!("Response for abandoned request {id} dropped");
                }
            }
            None => debug!("Response for unknown request {id} ignored"),
        }
    }

    /// Drop every in-flight entry. Each waiting caller observes a closed
    /// receiver and surfaces a transport failure.
    pub(crate) async fn abort_all(&self) {
        let entries = std::mem::take(&mut *self.entries.lock().await);
        if !entries.is_empty() {
            debug!("Aborting {} in-flight invoke(s)", entries.len());
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
