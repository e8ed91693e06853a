use staffdesk::config::ShellConfig;
use staffdesk::endpoint::EndpointInfo;

use bridge_core::channel::ChannelRegistry;
use bridge_core::client::Bridge;
use bridge_core::datastore::Datastore;
use bridge_core::host::{Dispatcher, HeadlessWindowManager, start_bridge_host};
use bridge_core::wire::QueryMethod;

use common::RedactedToken;

use std::sync::Arc;

// ============================================================================
// Integration tests for the shell wiring + bridge-core integration
// These exercise the same path main() takes, minus platform directories
// ============================================================================

/// **VALUE**: Tests that the shell's wiring sequence (config -> datastore
/// -> dispatcher -> host -> endpoint file) produces a bridge a renderer
/// can actually attach to.
///
/// **WHY THIS MATTERS**: This is the closest we can get to an end-to-end
/// launch test without platform data directories. It catches type or
/// contract drift between the app layer and bridge-core.
///
/// **BUG THIS CATCHES**: Would catch a config default that the host
/// refuses, an endpoint file that advertises the wrong port, or a
/// datastore handed to the dispatcher before migration.
#[tokio::test]
async fn given_shell_wiring_when_host_started_then_renderer_attaches() {
    // GIVEN: Default config and a migrated in-memory datastore
    let config = ShellConfig::default();
    assert!(config.validate().is_ok());

    let datastore = Datastore::open_in_memory().await.expect("store opens");
    datastore.migrate().await.expect("schema applies");

    let dispatcher = Dispatcher::new(
        Arc::new(ChannelRegistry::default_table()),
        datastore,
        Arc::new(HeadlessWindowManager::new()),
    );

    // WHEN: Starting the host the way main() does (ephemeral port here)
    let token = RedactedToken::new(String::from("shell-test-token"));
    let handle = start_bridge_host(0, Some(token.as_str().to_string()), dispatcher)
        .await
        .expect("host starts");

    // AND: Publishing the endpoint file
    let temp_dir = tempfile::tempdir().unwrap();
    EndpointInfo::new(handle.port(), token)
        .save(temp_dir.path())
        .expect("endpoint file publishes");

    // THEN: A renderer using the published endpoint attaches and queries
    let raw = std::fs::read_to_string(EndpointInfo::path_in(temp_dir.path())).unwrap();
    let endpoint: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let url = format!(
        "{}:{}",
        bridge_core::BRIDGE_WS_BASE_URL,
        endpoint["port"].as_u64().unwrap()
    );
    let bridge = Bridge::connect(&url, endpoint["token"].as_str().unwrap())
        .await
        .expect("renderer attaches with published endpoint");

    let rows = bridge
        .db()
        .query("employees", QueryMethod::FindAll, vec![])
        .await
        .expect("query succeeds");
    assert!(rows.is_empty(), "fresh store has no employees");
}
