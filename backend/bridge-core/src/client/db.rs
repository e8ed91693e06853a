//! Typed database gateway built atop `invoke`.
//!
//! The gateway marshals the three operation shapes across the boundary and
//! unmarshals typed results; it inspects nothing else. Failure semantics:
//! any host-side error rejects with a structured [`BridgeError`], and the
//! gateway performs no retries - partial-transaction retries without
//! idempotency knowledge are unsafe, so retry policy belongs to the
//! caller.

use crate::channel;
use crate::client::Bridge;
use crate::error::BridgeError;
use crate::wire::{DbRequest, QueryMethod};

use common::ErrorLocation;

use std::panic::Location;

use serde_json::Value;

/// Typed data-access surface over the db channels.
pub struct DbGateway {
    bridge: Bridge,
}

impl DbGateway {
    pub(crate) fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Read-style dispatch of `method` against `table`.
    ///
    /// Always resolves to a row sequence: zero matching rows yield an
    /// empty vector, never null, keeping the contract uniform.
    pub async fn query(
        &self,
        table: &str,
        method: QueryMethod,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, BridgeError> {
        let method_value = serde_json::to_value(method).map_err(encode_error)?;
        let result = self
            .bridge
            .invoke(
                channel::DB_QUERY,
                vec![
                    Value::String(table.to_string()),
                    method_value,
                    Value::Array(args),
                ],
            )
            .await?;
        expect_rows(result)
    }

    /// Raw parameterized statement. The result shape is backend-defined
    /// and passes through uninspected.
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<Value, BridgeError> {
        self.bridge
            .invoke(
                channel::DB_EXECUTE,
                vec![Value::String(sql.to_string()), Value::Array(params)],
            )
            .await
    }

    /// Ordered, all-or-nothing operation list.
    ///
    /// `result[i]` corresponds to `ops[i]`. If any operation fails
    /// host-side the whole call rejects and nothing is persisted.
    pub async fn transaction(&self, ops: Vec<DbRequest>) -> Result<Vec<Value>, BridgeError> {
        let raw_ops = ops
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(encode_error)?;

        let result = self
            .bridge
            .invoke(channel::DB_TRANSACTION, vec![Value::Array(raw_ops)])
            .await?;
        expect_rows(result)
    }
}

fn expect_rows(value: Value) -> Result<Vec<Value>, BridgeError> {
    match value {
        Value::Array(rows) => Ok(rows),
        other => Err(BridgeError::Decode {
            message: format!("host returned a non-sequence result: {other}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

#[track_caller]
fn encode_error(error: serde_json::Error) -> BridgeError {
    BridgeError::Encode {
        message: format!("failed to encode db operation: {error}"),
        location: ErrorLocation::from(Location::caller()),
    }
}
