// Unit tests for the published bridge endpoint file

use crate::endpoint::EndpointInfo;

use common::RedactedToken;

use serde_json::Value;

/// **VALUE**: Verifies the endpoint file carries the bound port and the
/// handshake token the UI process needs.
///
/// **WHY THIS MATTERS**: This file is the only discovery mechanism the
/// renderer has. A missing field strands the UI with no way to attach to
/// the bridge.
///
/// **BUG THIS CATCHES**: Would catch a `RedactedToken` accidentally
/// serialized through serde (which refuses) instead of `as_str`, or a
/// renamed JSON key.
#[test]
fn given_endpoint_info_when_saved_then_ui_readable_json() {
    // GIVEN: Endpoint info for a bound host
    let temp_dir = tempfile::tempdir().unwrap();
    let info = EndpointInfo::new(18745, RedactedToken::new(String::from("abc-123")));
    assert_eq!(info.port(), 18745);

    // WHEN: Publishing it
    info.save(temp_dir.path()).expect("save should succeed");

    // THEN: The file parses and carries both fields
    let raw = std::fs::read_to_string(EndpointInfo::path_in(temp_dir.path())).unwrap();
    let parsed: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["port"], 18745);
    assert_eq!(parsed["token"], "abc-123");
}
