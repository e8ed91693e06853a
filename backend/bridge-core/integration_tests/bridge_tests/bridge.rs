use crate::bridge_tests::helpers::{connect_test_bridge, host_url, start_test_host};

use bridge_core::client::Bridge;
use bridge_core::error::BridgeError;
use bridge_core::wire::{FaultKind, QueryMethod};

use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;

const EVENT_WAIT: Duration = Duration::from_secs(2);

/// **VALUE**: Verifies the token handshake end-to-end.
///
/// **WHY THIS MATTERS**: Auth is the security gate for every bridge
/// operation. If valid tokens were rejected, the renderer could never
/// reach the host at all.
///
/// **BUG THIS CATCHES**: Would catch a broken hello/ack exchange or a
/// host that validates the wrong token.
#[tokio::test]
async fn given_valid_token_when_connecting_then_handshake_succeeds() {
    // GIVEN: A running host
    let handle = start_test_host().await;

    // WHEN: Connecting with the expected token
    let bridge = connect_test_bridge(handle.port()).await;

    // THEN: The bridge is attached and usable
    assert!(bridge.is_attached());
}

/// **VALUE**: Verifies an invalid token is rejected at the handshake.
///
/// **WHY THIS MATTERS**: The token is the only thing standing between an
/// arbitrary local process and the privileged surface. Accepting any
/// token is a security breach.
#[tokio::test]
async fn given_invalid_token_when_connecting_then_handshake_rejected() {
    // GIVEN: A running host
    let handle = start_test_host().await;

    // WHEN: Connecting with the wrong token
    let result = Bridge::connect(&host_url(handle.port()), "wrong-token-xyz").await;

    // THEN: The handshake fails with a handshake error
    assert!(
        matches!(result, Err(BridgeError::Handshake { .. })),
        "expected handshake rejection, got {result:?}"
    );
}

/// **VALUE**: Verifies N concurrent invokes on one channel each resolve
/// exactly once, to their own result.
///
/// **WHY THIS MATTERS**: This is the correlation contract: responses are
/// matched by id, not arrival order. The host dispatches requests in
/// independent tasks, so completion order is unpredictable by
/// construction; any cross-resolution hands one caller another caller's
/// rows.
///
/// **BUG THIS CATCHES**: Would catch a pending map keyed by channel, a
/// host that copies the wrong id onto a response, or a router that
/// resolves in arrival order.
#[tokio::test]
async fn given_concurrent_invokes_when_overlapping_then_no_cross_resolution() {
    // GIVEN: A connected bridge
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;

    // WHEN: Eight overlapping inserts on the same channel
    let mut workers = Vec::new();
    for index in 0..8 {
        let db = bridge.db();
        workers.push(tokio::spawn(async move {
            let first_name = format!("worker-{index}");
            let rows = db
                .query(
                    "employees",
                    QueryMethod::Insert,
                    vec![json!({ "first_name": first_name, "last_name": "Test" })],
                )
                .await
                .expect("insert should succeed");
            (index, rows)
        }));
    }

    // THEN: Every caller got back the row it inserted
    for worker in workers {
        let (index, rows) = worker.await.expect("worker should not panic");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0]["first_name"],
            json!(format!("worker-{index}")),
            "response must belong to its own request"
        );
    }
}

/// **VALUE**: Verifies send/on fan-out across clients and that
/// unsubscribing one handler leaves its siblings receiving.
///
/// **WHY THIS MATTERS**: `on` promises every subscription sees every
/// event, each independently cancellable, and that after `unsubscribe`
/// zero further invocations happen no matter how many more events are
/// published.
#[tokio::test]
async fn given_subscriptions_when_messages_relayed_then_fan_out_and_cancellation_hold() {
    // GIVEN: Two clients; the second subscribes twice on example-channel
    let handle = start_test_host().await;
    let sender = connect_test_bridge(handle.port()).await;
    let receiver = connect_test_bridge(handle.port()).await;

    let (first_tx, mut first_rx) = mpsc::unbounded_channel::<Value>();
    let (second_tx, mut second_rx) = mpsc::unbounded_channel::<Value>();
    let first = receiver.on("example-channel", move |payload| {
        let _ = first_tx.send(payload);
    });
    let _second = receiver.on("example-channel", move |payload| {
        let _ = second_tx.send(payload);
    });

    // WHEN: Publishing one message
    sender.send_message("example-channel", json!({ "seq": 1 }));

    // THEN: Both subscriptions received it
    let got_first = timeout(EVENT_WAIT, first_rx.recv())
        .await
        .expect("first handler should receive")
        .expect("channel open");
    let got_second = timeout(EVENT_WAIT, second_rx.recv())
        .await
        .expect("second handler should receive")
        .expect("channel open");
    assert_eq!(got_first, json!({ "seq": 1 }));
    assert_eq!(got_second, json!({ "seq": 1 }));

    // WHEN: Cancelling the first subscription and publishing again
    first.unsubscribe();
    sender.send_message("example-channel", json!({ "seq": 2 }));

    // THEN: The live handler sees the event, the cancelled one does not
    let got_second = timeout(EVENT_WAIT, second_rx.recv())
        .await
        .expect("surviving handler should receive")
        .expect("channel open");
    assert_eq!(got_second, json!({ "seq": 2 }));
    assert!(
        first_rx.try_recv().is_err(),
        "cancelled handler must receive nothing further"
    );
}

/// **VALUE**: Verifies an unlisted channel fails locally even with a
/// live host available.
///
/// **WHY THIS MATTERS**: The allow-list must short-circuit before the
/// boundary; the host never sees the name.
#[tokio::test]
async fn given_connected_bridge_when_invoking_unlisted_channel_then_local_rejection() {
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;

    let result = bridge.invoke("no-such-channel", vec![]).await;
    assert!(matches!(
        result,
        Err(BridgeError::ChannelNotAllowed { .. })
    ));
}

/// **VALUE**: Verifies malformed request shapes are rejected by the host
/// with a structured malformed-request fault, not forwarded to SQLite.
///
/// **BUG THIS CATCHES**: Would catch a dispatcher that passes untyped
/// args straight through and surfaces a confusing SQL error instead.
#[tokio::test]
async fn given_malformed_db_request_when_invoked_then_structured_fault() {
    // GIVEN: A connected bridge, bypassing the typed gateway
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;

    // WHEN: Sending a db:query with the wrong arity
    let result = bridge.invoke("db:query", vec![json!(1)]).await;

    // THEN: The failure is a malformed-request fault
    match result {
        Err(BridgeError::HostOperation { kind, .. }) => {
            assert_eq!(kind, FaultKind::MalformedRequest);
        }
        other => panic!("Expected a malformed-request fault, got {other:?}"),
    }
}
