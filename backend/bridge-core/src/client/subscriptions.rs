//! Event subscriptions with fan-out and idempotent cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;
use serde_json::Value;

/// Callback registered for a host -> renderer event channel. Receives the
/// event payload only - transport-level sender identity is stripped before
/// dispatch.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Handler registry shared between the bridge and its frame router.
///
/// Multiple independent subscriptions on one channel all receive each
/// event; each is cancellable on its own.
#[derive(Default)]
pub(crate) struct SubscriptionTable {
    next_subscription_id: AtomicU64,
    handlers: Mutex<HashMap<String, Vec<(u64, EventHandler)>>>,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, channel: &str, handler: EventHandler) -> u64 {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        match self.handlers.lock() {
            Ok(mut handlers) => handlers
                .entry(channel.to_string())
                .or_default()
                .push((id, handler)),
            Err(_) => warn!("Subscription table poisoned, handler on '{channel}' not registered"),
        }
        id
    }

    /// Drop one handler registration. Idempotent: removing an id that is
    /// already gone does nothing.
    pub(crate) fn remove(&self, channel: &str, id: u64) {
        let Ok(mut handlers) = self.handlers.lock() else {
            return;
        };
        if let Some(registered) = handlers.get_mut(channel) {
            registered.retain(|(entry_id, _)| *entry_id != id);
            if registered.is_empty() {
                handlers.remove(channel);
            }
        }
    }

    /// Invoke every handler currently registered for `channel`.
    ///
    /// Registration is re-checked per handler so that a subscription
    /// cancelled while earlier handlers ran is not invoked. The lock is
    /// released around each call, so handlers may themselves subscribe or
    /// unsubscribe.
    pub(crate) fn dispatch(&self, channel: &str, payload: Value) {
        let snapshot: Vec<(u64, EventHandler)> = match self.handlers.lock() {
            Ok(handlers) => handlers.get(channel).cloned().unwrap_or_default(),
            Err(_) => {
                warn!("Subscription table poisoned, dropping event on '{channel}'");
                return;
            }
        };

        for (id, handler) in snapshot {
            if self.is_registered(channel, id) {
                handler(payload.clone());
            }
        }
    }

    fn is_registered(&self, channel: &str, id: u64) -> bool {
        self.handlers
            .lock()
            .map(|handlers| {
                handlers
                    .get(channel)
                    .is_some_and(|registered| {
                        registered.iter().any(|(entry_id, _)| *entry_id == id)
                    })
            })
            .unwrap_or(false)
    }

    #[cfg(test)]
    pub(crate) fn handler_count(&self, channel: &str) -> usize {
        self.handlers
            .lock()
            .map(|handlers| handlers.get(channel).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

/// Cancellation token returned by [`Bridge::on`](crate::client::Bridge::on).
///
/// Dropping the token does **not** cancel the subscription; call
/// [`unsubscribe`](Subscription::unsubscribe). Calling it more than once
/// is a no-op.
pub struct Subscription {
    channel: String,
    id: u64,
    table: Option<Arc<SubscriptionTable>>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn live(channel: &str, id: u64, table: Arc<SubscriptionTable>) -> Self {
        Self {
            channel: channel.to_string(),
            id,
            table: Some(table),
            active: AtomicBool::new(true),
        }
    }

    /// A subscription that was never registered (disallowed channel). Its
    /// handler has already been dropped and will never run.
    pub(crate) fn inert(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            id: 0,
            table: None,
            active: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the handler can still receive events.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Cancel the subscription. After this returns, the handler receives
    /// no further events and its reference is released. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(table) = &self.table {
            table.remove(&self.channel, self.id);
        }
    }
}
