//! Test helpers for bridge integration tests.
//!
//! Each test boots its own host on an ephemeral port with a fresh
//! in-memory datastore, so tests are independent and order-free.

use bridge_core::channel::ChannelRegistry;
use bridge_core::client::Bridge;
use bridge_core::datastore::Datastore;
use bridge_core::host::{
    BridgeHostHandle, Dispatcher, HeadlessWindowManager, start_bridge_host,
};

use std::sync::Arc;

/// Test constant for authentication.
pub const TEST_AUTH_TOKEN: &str = "test-token-12345";

/// Start a host with the default capability table, a migrated in-memory
/// datastore and a headless window.
pub async fn start_test_host() -> BridgeHostHandle {
    let datastore = Datastore::open_in_memory()
        .await
        .expect("in-memory datastore should open");
    datastore.migrate().await.expect("schema should apply");

    let dispatcher = Dispatcher::new(
        Arc::new(ChannelRegistry::default_table()),
        datastore,
        Arc::new(HeadlessWindowManager::new()),
    );

    start_bridge_host(0, Some(String::from(TEST_AUTH_TOKEN)), dispatcher)
        .await
        .expect("bridge host should start")
}

/// WebSocket endpoint of a test host.
pub fn host_url(port: u16) -> String {
    format!("{}:{port}", bridge_core::BRIDGE_WS_BASE_URL)
}

/// Connect an authenticated bridge to a test host.
pub async fn connect_test_bridge(port: u16) -> Bridge {
    Bridge::connect(&host_url(port), TEST_AUTH_TOKEN)
        .await
        .expect("bridge should connect and authenticate")
}
