// Unit tests for the correlation map

use crate::client::pending::PendingInvokes;
use crate::wire::Outcome;

use serde_json::json;

/// **VALUE**: Verifies responses are matched by correlation id, not by
/// completion order.
///
/// **WHY THIS MATTERS**: The host answers overlapping requests in
/// whatever order they finish. If the map handed responses out by
/// arrival order, concurrent invokes on one channel would cross-resolve
/// to the wrong caller.
///
/// **BUG THIS CATCHES**: Would catch a map keyed by channel, or one that
/// pops an arbitrary entry on completion.
#[tokio::test]
async fn given_overlapping_registrations_when_completed_out_of_order_then_each_matches_own_id() {
    // GIVEN: Three in-flight registrations
    let pending = PendingInvokes::new();
    let (id_a, rx_a) = pending.register().await;
    let (id_b, rx_b) = pending.register().await;
    let (id_c, rx_c) = pending.register().await;
    assert!(id_a != id_b && id_b != id_c, "ids must be distinct");

    // WHEN: Completing them in reverse order with distinct payloads
    pending
        .complete(id_c, Outcome::Ok { value: json!("c") })
        .await;
    pending
        .complete(id_a, Outcome::Ok { value: json!("a") })
        .await;
    pending
        .complete(id_b, Outcome::Ok { value: json!("b") })
        .await;

    // THEN: Each receiver sees its own payload
    match rx_a.await.unwrap() {
        Outcome::Ok { value } => assert_eq!(value, json!("a")),
        other => panic!("Expected ok outcome, got {other:?}"),
    }
    match rx_b.await.unwrap() {
        Outcome::Ok { value } => assert_eq!(value, json!("b")),
        other => panic!("Expected ok outcome, got {other:?}"),
    }
    match rx_c.await.unwrap() {
        Outcome::Ok { value } => assert_eq!(value, json!("c")),
        other => panic!("Expected ok outcome, got {other:?}"),
    }
}

/// **VALUE**: Verifies exactly-once delivery: a completed id is gone.
///
/// **WHY THIS MATTERS**: The contract is one response (or failure) per
/// request. A second response for the same id must be ignored, not
/// delivered to some later request that reused the slot.
#[tokio::test]
async fn given_completed_id_when_completed_again_then_ignored() {
    let pending = PendingInvokes::new();
    let (id, rx) = pending.register().await;

    pending.complete(id, Outcome::Ok { value: json!(1) }).await;
    // Second completion must be a no-op, not a panic
    pending.complete(id, Outcome::Ok { value: json!(2) }).await;

    match rx.await.unwrap() {
        Outcome::Ok { value } => assert_eq!(value, json!(1)),
        other => panic!("Expected first outcome only, got {other:?}"),
    }
    assert_eq!(pending.len().await, 0);
}

/// **VALUE**: Verifies the host's uncorrelated fault id (0) never lands
/// on a real caller.
///
/// **BUG THIS CATCHES**: Would catch correlation ids starting at 0,
/// where the host's decode-failure responses would resolve the first
/// invoke with a malformed-request fault.
#[tokio::test]
async fn given_unknown_id_when_completed_then_dropped() {
    let pending = PendingInvokes::new();
    let (_id, rx) = pending.register().await;

    // WHEN: Completing the reserved uncorrelated id
    pending.complete(0, Outcome::Ok { value: json!(1) }).await;

    // THEN: The real registration is untouched
    assert_eq!(pending.len().await, 1);
    drop(rx);
}

/// **VALUE**: Verifies abandoned registrations are reclaimed and that
/// transport loss fails every waiter.
///
/// **WHY THIS MATTERS**: Dropped invoke futures must not leak map
/// entries, and a lost connection must reject - not hang - every caller
/// still waiting.
#[tokio::test]
async fn given_abandon_and_abort_when_called_then_entries_are_reclaimed() {
    let pending = PendingInvokes::new();

    // Abandon reclaims an entry whose request never hit the wire
    let (id, rx) = pending.register().await;
    pending.abandon(id).await;
    assert_eq!(pending.len().await, 0);
    drop(rx);

    // Abort drops every sender; waiting receivers observe closure
    let (_id, rx) = pending.register().await;
    pending.abort_all().await;
    assert!(
        rx.await.is_err(),
        "waiter must observe a closed channel after abort"
    );
    assert_eq!(pending.len().await, 0);
}
