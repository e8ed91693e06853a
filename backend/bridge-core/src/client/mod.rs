//! Client side of the bridge: the gateway object handed to the UI layer.
//!
//! A [`Bridge`] is explicitly constructed and injected at startup - there
//! is no ambient global. It exposes the minimal surface the renderer may
//! use: fire-and-forget [`send_message`](Bridge::send_message), event
//! subscription [`on`](Bridge::on), correlated [`invoke`](Bridge::invoke),
//! and the typed [`db`](Bridge::db) and [`window`](Bridge::window)
//! gateways built on top.
//!
//! Every entry point consults the same capability table before touching
//! the transport. `send` and `on` degrade silently on unlisted channels
//! (UI robustness over strictness); `invoke` and the db gateway reject, so
//! callers can branch on failure.
//!
//! # Detached mode
//!
//! [`Bridge::detached`] is the outside-the-shell mode used when the UI
//! runs in a plain browser during development: window controls become
//! no-ops, `is_maximized` resolves `false`, and invokes fail with a
//! transport error without ever attempting a connection.

pub mod db;
pub(crate) mod pending;
pub(crate) mod subscriptions;
pub mod window;

pub use db::DbGateway;
pub use subscriptions::{EventHandler, Subscription};
pub use window::WindowGateway;

use crate::channel::{ChannelDirection, ChannelRegistry};
use crate::client::pending::PendingInvokes;
use crate::client::subscriptions::SubscriptionTable;
use crate::error::BridgeError;
use crate::wire::{self, ClientFrame, HostFrame, Outcome};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound frame queue depth per bridge.
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// The capability-restricted gateway to the host process.
///
/// Cloning is cheap and shares the underlying connection, pending map and
/// subscription table.
#[derive(Clone)]
pub struct Bridge {
    pub(crate) registry: Arc<ChannelRegistry>,
    pub(crate) subscriptions: Arc<SubscriptionTable>,
    pub(crate) link: Link,
}

/// Connection state: attached to a host shell, or running detached.
#[derive(Clone)]
pub(crate) enum Link {
    Shell(Arc<ShellLink>),
    Detached,
}

pub(crate) struct ShellLink {
    pub(crate) outbound: mpsc::Sender<ClientFrame>,
    pub(crate) pending: Arc<PendingInvokes>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.link {
            Link::Shell(_) => "shell",
            Link::Detached => "detached",
        };
        f.debug_struct("Bridge").field("mode", &mode).finish()
    }
}

impl Bridge {
    /// Connect to a host shell and perform the token handshake.
    pub async fn connect(url: &str, token: &str) -> Result<Self, BridgeError> {
        Self::connect_with_registry(url, token, Arc::new(ChannelRegistry::default_table())).await
    }

    /// Connect with an explicit capability table (tests, embedders with a
    /// reduced surface).
    pub async fn connect_with_registry(
        url: &str,
        token: &str,
        registry: Arc<ChannelRegistry>,
    ) -> Result<Self, BridgeError> {
        let endpoint = Url::parse(url).map_err(|error| BridgeError::Transport {
            message: format!("invalid bridge endpoint '{url}': {error}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        if endpoint.scheme() != "ws" {
            return Err(BridgeError::Transport {
                message: format!(
                    "bridge endpoint must use the ws scheme, got '{}'",
                    endpoint.scheme()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (ws_stream, _) =
            connect_async(endpoint.as_str())
                .await
                .map_err(|error| BridgeError::Transport {
                    message: format!("failed to reach host shell: {error}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        let (mut write, mut read) = ws_stream.split();

        handshake(&mut write, &mut read, token).await?;

        let pending = Arc::new(PendingInvokes::new());
        let subscriptions = Arc::new(SubscriptionTable::new());
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);

        tokio::spawn(write_outbound(write, outbound_rx));
        tokio::spawn(route_frames(
            read,
            Arc::clone(&pending),
            Arc::clone(&subscriptions),
        ));

        Ok(Self {
            registry,
            subscriptions,
            link: Link::Shell(Arc::new(ShellLink {
                outbound: outbound_tx,
                pending,
            })),
        })
    }

    /// The outside-the-shell bridge for plain-browser development runs.
    pub fn detached() -> Self {
        Self::detached_with_registry(Arc::new(ChannelRegistry::default_table()))
    }

    pub fn detached_with_registry(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            registry,
            subscriptions: Arc::new(SubscriptionTable::new()),
            link: Link::Detached,
        }
    }

    /// Whether this bridge is attached to a live host shell.
    pub fn is_attached(&self) -> bool {
        matches!(self.link, Link::Shell(_))
    }

    /// Fire-and-forget message to the host. Best-effort by design: an
    /// unlisted channel or a delivery failure degrades to a log line, no
    /// error reaches the caller. Callers needing reliability must use
    /// [`invoke`](Bridge::invoke).
    pub fn send_message(&self, channel: &str, payload: Value) {
        if !self.registry.is_allowed(channel, ChannelDirection::Send) {
            warn!("Dropped message on unlisted channel '{channel}'");
            return;
        }

        match &self.link {
            Link::Shell(shell) => {
                let frame = ClientFrame::Message {
                    channel: channel.to_string(),
                    payload,
                };
                if shell.outbound.try_send(frame).is_err() {
                    warn!("Failed to queue message on '{channel}' (transport busy or closed)");
                }
            }
            Link::Detached => {
                debug!("Message on '{channel}' ignored outside the host shell");
            }
        }
    }

    /// Subscribe to a host -> renderer event channel.
    ///
    /// On an unlisted channel the handler is dropped immediately and the
    /// returned subscription is inert - it never fires and unsubscribing
    /// it is a no-op. Handlers receive the event payload only and must not
    /// assume any ordering relative to in-flight invokes.
    pub fn on(
        &self,
        channel: &str,
        handler: impl Fn(Value) + Send + Sync + 'static,
    ) -> Subscription {
        if !self.registry.is_allowed(channel, ChannelDirection::Event) {
            warn!("Subscription on unlisted channel '{channel}' will never fire");
            return Subscription::inert(channel);
        }

        let id = self.subscriptions.register(channel, Arc::new(handler));
        Subscription::live(channel, id, Arc::clone(&self.subscriptions))
    }

    /// One correlated request: resolves or rejects exactly once, matched
    /// to its own correlation id even when invokes on the same channel
    /// overlap.
    ///
    /// There is no built-in timeout; callers needing bounded latency wrap
    /// this in their own. Dropping the returned future abandons the
    /// response, but the host-side effect may still happen (at-most-once
    /// delivery, no cancellation propagation).
    pub async fn invoke(&self, channel: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        if !self.registry.is_allowed(channel, ChannelDirection::Invoke) {
            return Err(BridgeError::ChannelNotAllowed {
                channel: channel.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let shell = match &self.link {
            Link::Shell(shell) => shell,
            Link::Detached => {
                return Err(BridgeError::Transport {
                    message: String::from("not attached to a host shell"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let (id, receiver) = shell.pending.register().await;
        let frame = ClientFrame::Request {
            id,
            channel: channel.to_string(),
            args,
        };

        if let Err(error) = shell.outbound.send(frame).await {
            shell.pending.abandon(id).await;
            return Err(BridgeError::Transport {
                message: format!("failed to send request: {error}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        match receiver.await {
            Ok(Outcome::Ok { value }) => Ok(value),
            Ok(Outcome::Err { fault }) => Err(BridgeError::from_fault(fault)),
            Err(_) => Err(BridgeError::Transport {
                message: String::from("connection to host lost before the response arrived"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Typed database gateway built on [`invoke`](Bridge::invoke).
    pub fn db(&self) -> DbGateway {
        DbGateway::new(self.clone())
    }

    /// Window-control gateway with the inside-the-shell guard.
    pub fn window(&self) -> WindowGateway {
        WindowGateway::new(self.clone())
    }
}

/// Send the hello frame and wait for the host's ack.
async fn handshake(
    write: &mut SplitSink<Transport, Message>,
    read: &mut SplitStream<Transport>,
    token: &str,
) -> Result<(), BridgeError> {
    let hello = wire::encode(&ClientFrame::Hello {
        token: token.to_string(),
    })
    .map_err(|error| BridgeError::Encode {
        message: format!("failed to encode handshake: {error}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    write
        .send(Message::Text(hello.into()))
        .await
        .map_err(|error| BridgeError::Transport {
            message: format!("failed to send handshake: {error}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let Some(Ok(Message::Text(raw))) = read.next().await else {
        return Err(BridgeError::Handshake {
            message: String::from("host closed the connection during the handshake"),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    match wire::decode::<HostFrame>(raw.as_str()) {
        Ok(HostFrame::HelloAck { success: true, .. }) => Ok(()),
        Ok(HostFrame::HelloAck { success: false, error }) => Err(BridgeError::Handshake {
            message: error.unwrap_or_else(|| String::from("host rejected the handshake")),
            location: ErrorLocation::from(Location::caller()),
        }),
        Ok(_) => Err(BridgeError::Handshake {
            message: String::from("host sent an unexpected first frame"),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(error) => Err(BridgeError::Decode {
            message: format!("undecodable handshake ack: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Route incoming frames: responses to the pending map, events to the
/// subscription table. Ends when the transport goes away, failing every
/// in-flight invoke.
async fn route_frames(
    mut read: SplitStream<Transport>,
    pending: Arc<PendingInvokes>,
    subscriptions: Arc<SubscriptionTable>,
) {
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(raw)) => match wire::decode::<HostFrame>(raw.as_str()) {
                Ok(HostFrame::Response { id, outcome }) => {
                    pending.complete(id, outcome).await;
                }
                Ok(HostFrame::Event { channel, payload }) => {
                    subscriptions.dispatch(&channel, payload);
                }
                Ok(HostFrame::HelloAck { .. }) => {
                    warn!("Unexpected handshake ack after connect, ignoring");
                }
                Err(error) => warn!("Failed to decode host frame: {error}"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                warn!("Bridge transport error: {error}");
                break;
            }
        }
    }

    pending.abort_all().await;
    debug!("Bridge frame router stopped");
}

/// Drain the outbound queue onto the socket.
async fn write_outbound(
    mut write: SplitSink<Transport, Message>,
    mut outbound_rx: mpsc::Receiver<ClientFrame>,
) {
    while let Some(frame) = outbound_rx.recv().await {
        let raw = match wire::encode(&frame) {
            Ok(raw) => raw,
            Err(error) => {
                warn!("Failed to encode client frame: {error}");
                continue;
            }
        };

        if write.send(Message::Text(raw.into())).await.is_err() {
            debug!("Outbound write failed, connection presumed closed");
            break;
        }
    }
}
