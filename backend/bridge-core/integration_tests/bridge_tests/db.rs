use crate::bridge_tests::helpers::{connect_test_bridge, start_test_host};

use bridge_core::error::BridgeError;
use bridge_core::wire::{DbRequest, FaultKind, QueryMethod};

use serde_json::json;

/// **VALUE**: Verifies the empty-result contract end-to-end: zero
/// matching rows arrive as an empty sequence, never null.
///
/// **WHY THIS MATTERS**: Every list view iterates query results without
/// null checks. The host, the wire format and the gateway all have to
/// preserve "empty vector" for that to hold.
#[tokio::test]
async fn given_empty_table_when_queried_through_gateway_then_empty_sequence() {
    // GIVEN: A connected bridge over a fresh datastore
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;

    // WHEN: Querying an empty table
    let rows = bridge
        .db()
        .query("medical_visits", QueryMethod::FindAll, vec![])
        .await
        .expect("query should succeed");

    // THEN: The result is an empty sequence
    assert!(rows.is_empty());
}

/// **VALUE**: Verifies the typed gateway round-trip: insert through the
/// bridge, read back the stored row with its generated id.
#[tokio::test]
async fn given_inserted_row_when_found_by_id_then_round_trips() {
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;
    let db = bridge.db();

    // WHEN: Inserting through the gateway
    let inserted = db
        .query(
            "employees",
            QueryMethod::Insert,
            vec![json!({ "first_name": "Ada", "last_name": "Bell", "email": "ada@plant7.example" })],
        )
        .await
        .expect("insert should succeed");
    assert_eq!(inserted.len(), 1);
    let id = inserted[0]["id"].clone();

    // THEN: findById returns the identical row
    let found = db
        .query("employees", QueryMethod::FindById, vec![id])
        .await
        .expect("findById should succeed");
    assert_eq!(found, inserted);
}

/// **VALUE**: Verifies `execute` passes backend-defined result shapes
/// through uninspected - rows for selects, a rows-affected object for
/// mutations.
#[tokio::test]
async fn given_execute_when_run_through_gateway_then_shape_passes_through() {
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;
    let db = bridge.db();

    let mutation = db
        .execute(
            "INSERT INTO work_locations (name, city) VALUES (?1, ?2)",
            vec![json!("Depot"), json!("Nantes")],
        )
        .await
        .expect("mutation should succeed");
    assert_eq!(mutation, json!({ "rowsAffected": 1 }));

    let rows = db
        .execute("SELECT city FROM work_locations", vec![])
        .await
        .expect("select should succeed");
    assert_eq!(rows, json!([{ "city": "Nantes" }]));
}

/// **VALUE**: Verifies transaction results preserve operation order
/// across the boundary.
#[tokio::test]
async fn given_transaction_when_committed_then_ordered_results() {
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;

    let results = bridge
        .db()
        .transaction(vec![
            DbRequest::Query {
                table: String::from("employees"),
                method: QueryMethod::Insert,
                args: vec![json!({ "first_name": "Eva", "last_name": "Dorn" })],
            },
            DbRequest::Query {
                table: String::from("employees"),
                method: QueryMethod::FindAll,
                args: vec![],
            },
        ])
        .await
        .expect("transaction should commit");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0][0]["first_name"], json!("Eva"));
    assert_eq!(results[1].as_array().map(Vec::len), Some(1));
}

/// **VALUE**: Verifies the canonical atomicity scenario end-to-end:
/// insert an employee, then a contract referencing a nonexistent
/// employee - the future rejects and zero rows persist in either table.
///
/// **WHY THIS MATTERS**: This is the exact failure mode the UI relies on
/// when creating linked records: a constraint violation must not strand
/// partial state.
///
/// **BUG THIS CATCHES**: Would catch a host that applies operations
/// outside a transaction, or a gateway that swallows the rejection and
/// reports partial results.
#[tokio::test]
async fn given_constraint_violation_when_transaction_runs_then_zero_rows_persist() {
    let handle = start_test_host().await;
    let bridge = connect_test_bridge(handle.port()).await;
    let db = bridge.db();

    // WHEN: The second insert violates the employees foreign key
    let result = db
        .transaction(vec![
            DbRequest::Query {
                table: String::from("employees"),
                method: QueryMethod::Insert,
                args: vec![json!({ "first_name": "Ada", "last_name": "Bell" })],
            },
            DbRequest::Query {
                table: String::from("contracts"),
                method: QueryMethod::Insert,
                args: vec![json!({ "employee_id": 424242, "contract_type": "permanent" })],
            },
        ])
        .await;

    // THEN: The future rejects with a host-side fault
    match result {
        Err(BridgeError::HostOperation { kind, .. }) => {
            assert_eq!(kind, FaultKind::HostOperation);
        }
        other => panic!("Expected a host operation fault, got {other:?}"),
    }

    // AND: Neither table kept a row
    let employees = db
        .query("employees", QueryMethod::FindAll, vec![])
        .await
        .unwrap();
    let contracts = db
        .query("contracts", QueryMethod::FindAll, vec![])
        .await
        .unwrap();
    assert!(employees.is_empty(), "employee insert must be rolled back");
    assert!(contracts.is_empty(), "contract insert must not persist");
}
