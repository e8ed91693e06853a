//! Host side of the bridge.
//!
//! This module implements the privileged endpoint of the bridge: a
//! WebSocket transport bound to localhost, an authentication handshake,
//! and concurrent dispatch of correlated requests. It provides:
//!
//! - Bridge host (localhost-only accept loop)
//! - JSON frame protocol (see [`crate::wire`])
//! - Authentication handshake (first frame must carry the token)
//! - Request dispatch to the datastore and window manager
//! - Event fan-out to every connected renderer
//!
//! # Concurrency
//!
//! Each request runs in its own task and its response is queued when it
//! completes, so overlapping requests may answer out of order. Correlation
//! ids - not arrival order - pair responses with callers; the client side
//! holds the matching map.
//!
//! # Security
//!
//! - Localhost-only binding, non-loopback peers rejected silently
//! - First frame must be the token handshake (fail-closed)
//! - The capability table is consulted before any dispatch

mod auth;
pub mod dispatcher;
pub mod events;
mod handle;
pub mod window;

pub use dispatcher::Dispatcher;
pub use handle::BridgeHostHandle;
pub use window::{HeadlessWindowManager, WindowManager};

use crate::error::HostError;
use crate::host::auth::ConnectionAuth;
use crate::wire::{self, ClientFrame, HostFrame, Outcome, WireFault};

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// Per-connection outbound queue depth. Events beyond this for a stalled
/// connection are dropped (best-effort delivery).
const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Starts the bridge host on the specified port.
///
/// Binds `127.0.0.1:<port>` and spawns a background task accepting
/// renderer connections. Pass port 0 to bind an ephemeral port and read
/// it back from the returned handle.
///
/// # Arguments
///
/// * `port` - Port to bind on localhost
/// * `auth_token` - Expected handshake token; generated if `None`
/// * `dispatcher` - Routes validated requests to host capabilities
///
/// # Errors
///
/// Returns [`HostError::Io`] if the port is in use, permissions are
/// insufficient, or the interface is unavailable.
pub async fn start_bridge_host(
    port: u16,
    auth_token: Option<String>,
    dispatcher: Dispatcher,
) -> Result<BridgeHostHandle, HostError> {
    let auth_token = auth_token.unwrap_or_else(|| {
        let token = Uuid::new_v4().to_string();
        info!("Generated bridge auth token ({} chars)", token.len());
        token
    });

    let address = format!("{}:{port}", crate::BRIDGE_HOSTNAME);
    let listener = TcpListener::bind(&address).await?;
    let bound_port = listener.local_addr()?.port();

    info!(
        "Bridge host listening on {}:{bound_port}",
        crate::BRIDGE_HOSTNAME
    );

    tokio::spawn(async move {
        while let Ok((stream, addr)) = listener.accept().await {
            info!("Client connecting from {addr}");
            let token_clone = auth_token.clone();
            let dispatcher_clone = dispatcher.clone();
            tokio::spawn(handle_connection(
                stream,
                addr,
                token_clone,
                dispatcher_clone,
            ));
        }
    });

    Ok(BridgeHostHandle::new(bound_port))
}

/// Handles a single renderer connection.
///
/// 1. Performs the WebSocket handshake
/// 2. **Rejects non-localhost peers** (silent, fail-closed)
/// 3. **Requires the token handshake as first frame**
/// 4. Serves request/message frames until disconnect
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    auth_token: String,
    dispatcher: Dispatcher,
) -> Result<(), HostError> {
    // SECURITY: reject non-loopback peers without giving them information
    if !addr.ip().is_loopback() {
        warn!("Rejected non-loopback connection from {addr}");
        return Ok(());
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(error) => {
            error!("WebSocket handshake failed: {error}");
            return Err(HostError::Handshake {
                message: format!("WebSocket handshake failed: {error}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let (write, mut read) = ws_stream.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<HostFrame>(OUTBOUND_QUEUE_DEPTH);
    tokio::spawn(write_outbound(write, outbound_rx));

    let mut auth = ConnectionAuth::new(auth_token);

    // SECURITY: first frame MUST be the token handshake
    let Some(first) = read.next().await else {
        warn!("Client {addr} disconnected before handshake");
        return Ok(());
    };
    match first {
        Ok(Message::Text(raw)) => match wire::decode::<ClientFrame>(raw.as_str()) {
            Ok(ClientFrame::Hello { token }) => {
                if auth.validate_token(&token) {
                    info!("Client {addr} authenticated successfully");
                    send_frame(
                        &outbound_tx,
                        HostFrame::HelloAck {
                            success: true,
                            error: None,
                        },
                    )
                    .await?;
                } else {
                    warn!("Client {addr} handshake failed: invalid token");
                    send_frame(
                        &outbound_tx,
                        HostFrame::HelloAck {
                            success: false,
                            error: Some(String::from("Invalid authentication token")),
                        },
                    )
                    .await?;
                    return Ok(()); // Close connection
                }
            }
            Ok(_) => {
                warn!("Client {addr} handshake failed: first frame was not hello");
                return Ok(()); // Close connection (no response)
            }
            Err(error) => {
                warn!("Client {addr} sent undecodable first frame: {error}");
                return Ok(());
            }
        },
        Ok(_) => {
            warn!("Client {addr} sent non-text first frame");
            return Ok(());
        }
        Err(error) => {
            error!("Error reading handshake from {addr}: {error}");
            return Err(HostError::Read {
                message: format!("Error reading handshake: {error}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    }
    debug_assert!(auth.is_authenticated());

    let hub_id = dispatcher.events().attach(outbound_tx.clone());
    let result = serve_frames(&mut read, &outbound_tx, &dispatcher, addr).await;
    dispatcher.events().detach(hub_id);

    info!("Client {addr} disconnected");
    result
}

/// Main frame loop for an authenticated connection.
async fn serve_frames(
    read: &mut SplitStream<WebSocketStream<TcpStream>>,
    outbound_tx: &mpsc::Sender<HostFrame>,
    dispatcher: &Dispatcher,
    addr: SocketAddr,
) -> Result<(), HostError> {
    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(raw)) => match wire::decode::<ClientFrame>(raw.as_str()) {
                Ok(ClientFrame::Request { id, channel, args }) => {
                    // Each request completes in its own task; the client's
                    // correlation map tolerates out-of-order responses.
                    let dispatcher = dispatcher.clone();
                    let response_tx = outbound_tx.clone();
                    tokio::spawn(async move {
                        let outcome = dispatcher.dispatch(&channel, args).await;
                        let frame = HostFrame::Response { id, outcome };
                        if response_tx.send(frame).await.is_err() {
                            debug!("Connection closed before response {id} was sent");
                        }
                    });
                }
                Ok(ClientFrame::Message { channel, payload }) => {
                    dispatcher.relay(&channel, payload);
                }
                Ok(ClientFrame::Hello { .. }) => {
                    warn!("Client {addr} repeated the handshake, ignoring");
                }
                Err(error) => {
                    warn!("Failed to decode frame from {addr}: {error}");
                    // id 0 is never allocated by a client, so this cannot
                    // cross-resolve with a real invoke.
                    send_frame(
                        outbound_tx,
                        HostFrame::Response {
                            id: 0,
                            outcome: Outcome::Err {
                                fault: WireFault::malformed_request("invalid frame"),
                            },
                        },
                    )
                    .await?;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                warn!("Client {addr} sent non-text frame, ignoring");
            }
            Err(error) => {
                error!("Error reading frame from {addr}: {error}");
                return Err(HostError::Read {
                    message: format!("Error reading frame: {error}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    Ok(())
}

/// Queue a frame on the connection's outbound channel.
async fn send_frame(
    outbound_tx: &mpsc::Sender<HostFrame>,
    frame: HostFrame,
) -> Result<(), HostError> {
    outbound_tx
        .send(frame)
        .await
        .map_err(|error| HostError::Send {
            message: format!("outbound queue closed: {error}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

/// Drains the outbound queue onto the socket. Ends when the queue closes
/// or the socket goes away.
async fn write_outbound(
    mut write: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound_rx: mpsc::Receiver<HostFrame>,
) {
    while let Some(frame) = outbound_rx.recv().await {
        let raw = match wire::encode(&frame) {
            Ok(raw) => raw,
            Err(error) => {
                error!("Failed to encode host frame: {error}");
                continue;
            }
        };

        if write.send(Message::Text(raw.into())).await.is_err() {
            debug!("Outbound write failed, connection presumed closed");
            break;
        }
    }
}
