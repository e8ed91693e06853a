//! Host -> renderer event fan-out.
//!
//! Each authenticated connection registers its outbound queue here; a
//! published event is copied to every registered connection. Delivery is
//! best-effort by design - a slow or closed connection drops the event
//! rather than stalling the publisher.
//!
//! Event frames carry channel and payload only; the hub's connection ids
//! never leave the host process.

use crate::wire::HostFrame;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde_json::Value;
use tokio::sync::mpsc;

/// Registry of live connection outbound queues.
#[derive(Default)]
pub struct EventHub {
    connections: Mutex<HashMap<u64, mpsc::Sender<HostFrame>>>,
    next_connection_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue. Returns the id to pass to
    /// [`EventHub::detach`] on disconnect.
    pub fn attach(&self, outbound: mpsc::Sender<HostFrame>) -> u64 {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        match self.connections.lock() {
            Ok(mut connections) => {
                connections.insert(id, outbound);
                debug!("Connection {id} attached to event hub");
            }
            Err(_) => warn!("Event hub mutex poisoned, connection {id} not attached"),
        }
        id
    }

    /// Remove a disconnected connection. Idempotent.
    pub fn detach(&self, id: u64) {
        if let Ok(mut connections) = self.connections.lock() {
            connections.remove(&id);
            debug!("Connection {id} detached from event hub");
        }
    }

    /// Publish an event to every attached connection.
    pub fn publish(&self, channel: &str, payload: Value) {
        let senders: Vec<mpsc::Sender<HostFrame>> = match self.connections.lock() {
            Ok(connections) => connections.values().cloned().collect(),
            Err(_) => {
                warn!("Event hub mutex poisoned, dropping event on '{channel}'");
                return;
            }
        };

        let frame = HostFrame::Event {
            channel: channel.to_string(),
            payload,
        };

        for sender in senders {
            if sender.try_send(frame.clone()).is_err() {
                debug!("Dropped event on '{channel}' for a slow or closed connection");
            }
        }
    }
}
