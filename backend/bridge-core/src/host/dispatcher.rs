//! Request routing for the bridge host.
//!
//! The dispatcher is the host-side authorization point: it consults the
//! capability table before any capability is touched, then routes db
//! channels to the datastore and window channels to the window manager.
//! Every failure becomes a structured fault; the host never retries.

use crate::channel::{self, ChannelDirection, ChannelRegistry};
use crate::datastore::Datastore;
use crate::error::DatastoreError;
use crate::host::events::EventHub;
use crate::host::window::WindowManager;
use crate::wire::{DbRequest, Outcome, QueryMethod, WireFault};

use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

/// Routes validated requests to the host's capabilities.
///
/// Cloning shares the registry, datastore, window manager and event hub.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ChannelRegistry>,
    datastore: Datastore,
    window: Arc<dyn WindowManager>,
    events: Arc<EventHub>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        datastore: Datastore,
        window: Arc<dyn WindowManager>,
    ) -> Self {
        Self {
            registry,
            datastore,
            window,
            events: Arc::new(EventHub::new()),
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    /// Handle one correlated request and produce its single outcome.
    pub async fn dispatch(&self, channel: &str, args: Vec<Value>) -> Outcome {
        if !self.registry.is_allowed(channel, ChannelDirection::Invoke) {
            warn!("Rejected invoke on unlisted channel '{channel}'");
            return fail(WireFault::channel_not_allowed(channel));
        }

        let result = match channel {
            channel::DB_QUERY => self.handle_query(args).await,
            channel::DB_EXECUTE => self.handle_execute(args).await,
            channel::DB_TRANSACTION => self.handle_transaction(args).await,

            channel::WINDOW_MINIMIZE => {
                self.window.minimize();
                Ok(Value::Null)
            }
            channel::WINDOW_MAXIMIZE => {
                self.window.maximize();
                Ok(Value::Null)
            }
            channel::WINDOW_UNMAXIMIZE => {
                self.window.unmaximize();
                Ok(Value::Null)
            }
            channel::WINDOW_CLOSE => {
                self.window.close();
                Ok(Value::Null)
            }
            channel::WINDOW_IS_MAXIMIZED => Ok(Value::Bool(self.window.is_maximized())),

            other => Err(WireFault::host_operation(format!(
                "no host handler for channel '{other}'"
            ))),
        };

        match result {
            Ok(value) => Outcome::Ok { value },
            Err(fault) => fail(fault),
        }
    }

    /// Relay a fire-and-forget message as an event to every connection.
    ///
    /// Disallowed channels are dropped here, never forwarded; the sender
    /// gets no error by design.
    pub fn relay(&self, channel: &str, payload: Value) {
        if !self.registry.is_allowed(channel, ChannelDirection::Send) {
            warn!("Dropped message on unlisted channel '{channel}'");
            return;
        }

        self.events.publish(channel, payload);
    }

    async fn handle_query(&self, args: Vec<Value>) -> Result<Value, WireFault> {
        let (table, method, query_args) = parse_query_args(args)?;
        let rows = self
            .datastore
            .query(table, method, query_args)
            .await
            .map_err(datastore_fault)?;
        Ok(Value::Array(rows))
    }

    async fn handle_execute(&self, args: Vec<Value>) -> Result<Value, WireFault> {
        let (sql, params) = parse_execute_args(args)?;
        info!("Executing raw statement through db:execute");
        self.datastore
            .execute(sql, params)
            .await
            .map_err(datastore_fault)
    }

    async fn handle_transaction(&self, args: Vec<Value>) -> Result<Value, WireFault> {
        let ops = parse_transaction_args(args)?;
        let results = self
            .datastore
            .transaction(ops)
            .await
            .map_err(datastore_fault)?;
        Ok(Value::Array(results))
    }
}

fn fail(fault: WireFault) -> Outcome {
    Outcome::Err { fault }
}

/// `db:query` args: `[table, method, args]`.
fn parse_query_args(
    mut args: Vec<Value>,
) -> Result<(String, QueryMethod, Vec<Value>), WireFault> {
    if args.len() != 3 {
        return Err(WireFault::malformed_request(format!(
            "db:query expects [table, method, args], got {} argument(s)",
            args.len()
        )));
    }

    let query_args = match args.remove(2) {
        Value::Array(items) => items,
        other => {
            return Err(WireFault::malformed_request(format!(
                "db:query args must be an array, got {other}"
            )));
        }
    };
    let method_value = args.remove(1);
    let method: QueryMethod = serde_json::from_value(method_value).map_err(|error| {
        WireFault::malformed_request(format!("db:query method is not a known verb: {error}"))
    })?;
    let table = match args.remove(0) {
        Value::String(table) => table,
        other => {
            return Err(WireFault::malformed_request(format!(
                "db:query table must be a string, got {other}"
            )));
        }
    };

    Ok((table, method, query_args))
}

/// `db:execute` args: `[sql, params]`, params optional.
fn parse_execute_args(mut args: Vec<Value>) -> Result<(String, Vec<Value>), WireFault> {
    if args.is_empty() || args.len() > 2 {
        return Err(WireFault::malformed_request(format!(
            "db:execute expects [sql, params?], got {} argument(s)",
            args.len()
        )));
    }

    let params = if args.len() == 2 {
        match args.remove(1) {
            Value::Array(items) => items,
            other => {
                return Err(WireFault::malformed_request(format!(
                    "db:execute params must be an array, got {other}"
                )));
            }
        }
    } else {
        Vec::new()
    };

    let sql = match args.remove(0) {
        Value::String(sql) => sql,
        other => {
            return Err(WireFault::malformed_request(format!(
                "db:execute sql must be a string, got {other}"
            )));
        }
    };

    Ok((sql, params))
}

/// `db:transaction` args: `[ops]` where each op is a tagged query/execute
/// shape. Malformed shapes are rejected here, not forwarded.
fn parse_transaction_args(mut args: Vec<Value>) -> Result<Vec<DbRequest>, WireFault> {
    if args.len() != 1 {
        return Err(WireFault::malformed_request(format!(
            "db:transaction expects [operations], got {} argument(s)",
            args.len()
        )));
    }

    let Value::Array(raw_ops) = args.remove(0) else {
        return Err(WireFault::malformed_request(
            "db:transaction operations must be an array",
        ));
    };

    raw_ops
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value::<DbRequest>(raw).map_err(|error| {
                WireFault::malformed_request(format!(
                    "db:transaction operation {index} has an invalid shape: {error}"
                ))
            })
        })
        .collect()
}

fn datastore_fault(error: DatastoreError) -> WireFault {
    match error {
        DatastoreError::InvalidArguments { .. } => {
            WireFault::malformed_request(error.to_string())
        }
        other => WireFault::host_operation(other.to_string()),
    }
}
