// Unit tests for the client gateway's local authorization checks.
// These build bridges around an observable outbound queue, so they can
// assert that rejected operations produce no frame at all.

use crate::channel::ChannelRegistry;
use crate::client::pending::PendingInvokes;
use crate::client::subscriptions::SubscriptionTable;
use crate::client::{Bridge, Link, ShellLink};
use crate::error::BridgeError;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

fn bridge_with_observable_link() -> (Bridge, mpsc::Receiver<crate::wire::ClientFrame>) {
    let (outbound_tx, outbound_rx) = mpsc::channel(8);
    let bridge = Bridge {
        registry: Arc::new(ChannelRegistry::default_table()),
        subscriptions: Arc::new(SubscriptionTable::new()),
        link: Link::Shell(Arc::new(ShellLink {
            outbound: outbound_tx,
            pending: Arc::new(PendingInvokes::new()),
        })),
    };
    (bridge, outbound_rx)
}

/// **VALUE**: Verifies that a disallowed `send_message` never produces a
/// frame on the transport.
///
/// **WHY THIS MATTERS**: The allow-list is only an authorization boundary
/// if rejection happens before the transport. A frame that reaches the
/// host for filtering there has already crossed the boundary.
///
/// **BUG THIS CATCHES**: Would catch an entry point that queues first and
/// checks later, or that forgets the direction check.
#[tokio::test]
async fn given_disallowed_channel_when_send_message_then_no_frame_crosses() {
    // GIVEN: An attached bridge with an observable outbound queue
    let (bridge, mut outbound_rx) = bridge_with_observable_link();

    // WHEN: Sending on an unlisted channel and on a listed channel with
    // the wrong direction
    bridge.send_message("no-such-channel", json!(1));
    bridge.send_message("db:query", json!(1));

    // THEN: Nothing was queued for the transport
    assert!(
        outbound_rx.try_recv().is_err(),
        "no frame may cross for disallowed sends"
    );
}

/// **VALUE**: Verifies a disallowed `invoke` fails locally with
/// `ChannelNotAllowed` and leaves no frame or pending entry behind.
///
/// **BUG THIS CATCHES**: Would catch an invoke that registers a
/// correlation id (leaking a map entry) before the capability check.
#[tokio::test]
async fn given_disallowed_channel_when_invoke_then_rejected_before_boundary() {
    // GIVEN: An attached bridge with an observable outbound queue
    let (bridge, mut outbound_rx) = bridge_with_observable_link();

    // WHEN: Invoking an unlisted channel
    let result = bridge.invoke("no-such-channel", vec![]).await;

    // THEN: The local error is ChannelNotAllowed, not a transport error
    assert!(
        matches!(result, Err(BridgeError::ChannelNotAllowed { .. })),
        "expected ChannelNotAllowed, got {result:?}"
    );

    // AND: No frame crossed, no correlation entry leaked
    assert!(outbound_rx.try_recv().is_err());
    if let Link::Shell(shell) = &bridge.link {
        assert_eq!(shell.pending.len().await, 0);
    }
}

/// **VALUE**: Verifies the capability check precedes the transport
/// branch: a detached bridge still reports `ChannelNotAllowed` for
/// unlisted channels, and a transport failure only for listed ones.
///
/// **WHY THIS MATTERS**: Callers branch on the error kind. If detached
/// mode reported everything as a transport failure, a misspelled channel
/// name would be indistinguishable from a missing host.
#[tokio::test]
async fn given_detached_bridge_when_invoked_then_error_kind_depends_on_channel() {
    // GIVEN: A detached bridge (plain-browser development mode)
    let bridge = Bridge::detached();
    assert!(!bridge.is_attached());

    // THEN: Unlisted channel fails the capability check first
    let unlisted = bridge.invoke("no-such-channel", vec![]).await;
    assert!(matches!(
        unlisted,
        Err(BridgeError::ChannelNotAllowed { .. })
    ));

    // AND: A listed channel fails with a transport error
    let listed = bridge.invoke("db:query", vec![]).await;
    assert!(matches!(listed, Err(BridgeError::Transport { .. })));
}

/// **VALUE**: Verifies `on` returns an inert subscription for unlisted
/// channels and a live one otherwise.
///
/// **BUG THIS CATCHES**: Would catch a disallowed subscription that
/// still lands in the table and fires when the host broadcasts.
#[tokio::test]
async fn given_disallowed_channel_when_subscribing_then_inert_subscription() {
    let (bridge, _outbound_rx) = bridge_with_observable_link();

    let inert = bridge.on("no-such-channel", |_payload| {});
    assert!(!inert.is_active());
    assert_eq!(bridge.subscriptions.handler_count("no-such-channel"), 0);

    let live = bridge.on("example-channel", |_payload| {});
    assert!(live.is_active());
    assert_eq!(bridge.subscriptions.handler_count("example-channel"), 1);

    live.unsubscribe();
    assert_eq!(bridge.subscriptions.handler_count("example-channel"), 0);
}

/// **VALUE**: Verifies the detached window gateway honors the
/// outside-the-shell guard: mutating calls are no-ops and
/// `is_maximized` resolves `false` without error.
///
/// **WHY THIS MATTERS**: The UI runs in a plain browser during
/// development, where no host shell exists. Window chrome code must keep
/// working without special-casing.
#[tokio::test]
async fn given_detached_bridge_when_window_controls_used_then_safe_defaults() {
    // GIVEN: A detached bridge
    let bridge = Bridge::detached();
    let window = bridge.window();

    // WHEN: Driving every control
    window.minimize().await;
    window.maximize().await;
    window.unmaximize().await;
    window.close().await;

    // THEN: The state query resolves to the fixed default
    let maximized = window.is_maximized().await.expect("must not error");
    assert!(!maximized, "detached is_maximized must resolve false");
}
