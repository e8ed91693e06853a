// Unit tests for error module
// Tests error serialization (errors cross to the UI process as JSON)

use crate::error::StaffdeskError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors can be serialized (required to surface
/// them to the UI process).
///
/// **WHY THIS MATTERS**: The shell reports wiring failures to the
/// renderer as structured JSON. If serialization breaks, the frontend
/// receives opaque errors.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or if the error structure becomes non-serializable (e.g., adding a non-serializable field).
#[test]
fn given_staffdesk_error_when_serialized_then_succeeds() {
    // GIVEN: A StaffdeskError
    let err = StaffdeskError::Core {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let result = serde_json::to_string(&err);

    // THEN: Should succeed
    assert!(result.is_ok(), "Error should be serializable for the UI");

    // AND: Should contain the error data
    let json = result.unwrap();
    assert!(json.contains("Core"), "JSON should contain variant name");
    assert!(json.contains("Test"), "JSON should contain message");
}
