// Unit tests for the wire protocol shapes.
// The JSON layout is a contract with the renderer bundle, so these tests
// pin the exact tags and casing, not just round-trip equality.

use crate::wire::{
    ClientFrame, DbRequest, FaultKind, HostFrame, Outcome, QueryMethod, WireFault, decode, encode,
};

use serde_json::{Value, json};

/// **VALUE**: Pins the request frame layout (snake_case tag, id, channel,
/// args list).
///
/// **WHY THIS MATTERS**: The renderer builds these frames byte-for-byte;
/// a silently renamed field breaks every invoke with undecodable-frame
/// warnings instead of a compile error.
///
/// **BUG THIS CATCHES**: Would catch a dropped `#[serde(tag)]` or
/// `rename_all` attribute on the frame enums.
#[test]
fn given_request_frame_when_encoded_then_layout_is_stable() {
    // GIVEN: A request frame
    let frame = ClientFrame::Request {
        id: 7,
        channel: String::from("db:query"),
        args: vec![json!("employees")],
    };

    // WHEN: Encoding it
    let raw = encode(&frame).expect("frame should encode");
    let parsed: Value = serde_json::from_str(&raw).unwrap();

    // THEN: The wire layout is the documented one
    assert_eq!(parsed["type"], "request");
    assert_eq!(parsed["id"], 7);
    assert_eq!(parsed["channel"], "db:query");
    assert_eq!(parsed["args"], json!(["employees"]));
}

/// **VALUE**: Verifies fault outcomes round-trip with snake_case kinds.
///
/// **WHY THIS MATTERS**: Callers branch on the fault kind to decide
/// whether an operation was unauthorized, malformed, or failed host-side.
/// A casing drift turns every structured error into a decode failure.
///
/// **BUG THIS CATCHES**: Would catch `FaultKind` serializing as
/// `ChannelNotAllowed` instead of `channel_not_allowed`.
#[test]
fn given_fault_outcome_when_round_tripped_then_kind_survives() {
    // GIVEN: A response carrying a structured fault
    let frame = HostFrame::Response {
        id: 3,
        outcome: Outcome::Err {
            fault: WireFault::new(FaultKind::ChannelNotAllowed, "nope"),
        },
    };

    // WHEN: Encoding and inspecting the raw JSON
    let raw = encode(&frame).expect("frame should encode");
    let parsed: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["outcome"]["status"], "err");
    assert_eq!(parsed["outcome"]["fault"]["kind"], "channel_not_allowed");

    // THEN: Decoding restores the same fault
    let decoded: HostFrame = decode(&raw).expect("frame should decode");
    match decoded {
        HostFrame::Response {
            id: 3,
            outcome: Outcome::Err { fault },
        } => {
            assert_eq!(fault.kind, FaultKind::ChannelNotAllowed);
            assert_eq!(fault.message, "nope");
        }
        other => panic!("Expected the fault response back, got {other:?}"),
    }
}

/// **VALUE**: Pins the camelCase query verbs (`findAll`, `findById`, ...).
///
/// **WHY THIS MATTERS**: The verbs are part of the renderer-facing
/// contract; the host parses them out of untyped args.
///
/// **BUG THIS CATCHES**: Would catch a `rename_all` change that turns
/// `findAll` into `find_all` and breaks every query dispatch.
#[test]
fn given_query_methods_when_serialized_then_camel_case() {
    assert_eq!(serde_json::to_value(QueryMethod::FindAll).unwrap(), "findAll");
    assert_eq!(
        serde_json::to_value(QueryMethod::FindById).unwrap(),
        "findById"
    );
    assert_eq!(
        serde_json::to_value(QueryMethod::FindWhere).unwrap(),
        "findWhere"
    );
    assert_eq!(serde_json::to_value(QueryMethod::Insert).unwrap(), "insert");

    let parsed: QueryMethod = serde_json::from_value(json!("findWhere")).unwrap();
    assert_eq!(parsed, QueryMethod::FindWhere);
}

/// **VALUE**: Verifies the tagged transaction-operation union rejects
/// unknown shapes.
///
/// **WHY THIS MATTERS**: Transaction lists arrive as untyped JSON; the
/// tag is what lets the host reject malformed shapes at the boundary
/// instead of forwarding arbitrary data to SQLite.
///
/// **BUG THIS CATCHES**: Would catch an untagged `DbRequest` that happily
/// deserializes garbage into an `Execute` with an empty statement.
#[test]
fn given_db_request_when_round_tripped_then_tag_is_enforced() {
    // GIVEN: A query-shaped operation
    let op = DbRequest::Query {
        table: String::from("employees"),
        method: QueryMethod::Insert,
        args: vec![json!({ "first_name": "Ada" })],
    };

    // WHEN: Encoding it
    let raw = serde_json::to_value(&op).unwrap();

    // THEN: The tag and verb casing are the documented ones
    assert_eq!(raw["op"], "query");
    assert_eq!(raw["method"], "insert");

    // AND: A shape without the tag is rejected
    let malformed = serde_json::from_value::<DbRequest>(json!({ "table": "employees" }));
    assert!(malformed.is_err(), "untagged shape must not deserialize");
}

/// **VALUE**: Verifies undecodable frames fail decoding instead of
/// panicking or defaulting.
///
/// **BUG THIS CATCHES**: Would catch a lenient decoder that maps unknown
/// frame types onto some default variant.
#[test]
fn given_garbage_when_decoded_then_error() {
    assert!(decode::<ClientFrame>("not json").is_err());
    assert!(decode::<ClientFrame>(r#"{"type":"teleport"}"#).is_err());
}
