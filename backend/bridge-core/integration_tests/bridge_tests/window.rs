use crate::bridge_tests::helpers::{connect_test_bridge, start_test_host};

use bridge_core::client::Bridge;

/// **VALUE**: Verifies the window-control round-trip against the host's
/// window manager.
///
/// **WHY THIS MATTERS**: Window chrome buttons are thin invokes; if the
/// state query lies, the maximize/restore toggle renders the wrong icon
/// forever.
#[tokio::test]
async fn given_attached_bridge_when_toggling_maximize_then_state_tracks() {
    // GIVEN: A connected bridge
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;
    let window = bridge.window();

    // THEN: The window starts unmaximized
    assert!(!window.is_maximized().await.expect("state query works"));

    // WHEN: Maximizing
    window.maximize().await;
    assert!(window.is_maximized().await.expect("state query works"));

    // WHEN: Restoring
    window.unmaximize().await;
    assert!(!window.is_maximized().await.expect("state query works"));
}

/// **VALUE**: Verifies two clients observe the same host window state.
///
/// **WHY THIS MATTERS**: The host owns the window; the bridge must not
/// cache state per connection.
#[tokio::test]
async fn given_two_clients_when_one_maximizes_then_other_observes_it() {
    let handle = start_test_host().await;
    let driver = connect_test_bridge(handle.port()).await;
    let observer = connect_test_bridge(handle.port()).await;

    driver.window().maximize().await;

    assert!(
        observer
            .window()
            .is_maximized()
            .await
            .expect("state query works"),
        "window state lives in the host, not the connection"
    );
}

/// **VALUE**: Verifies the detached guard against a world where a host
/// does exist: detached mode must not secretly connect.
#[tokio::test]
async fn given_detached_bridge_when_host_exists_then_still_fixed_default() {
    // GIVEN: A running host and a bridge that never attached to it
    let _handle = start_test_host().await;
    let bridge = Bridge::detached();

    // THEN: is_maximized resolves the fixed default without error
    assert!(!bridge.window().is_maximized().await.expect("must not error"));
}
