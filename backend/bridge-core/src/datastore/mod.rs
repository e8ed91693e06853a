//! Host datastore behind the db channels.
//!
//! The host process exclusively owns the database handle; the bridge only
//! forwards validated requests here and marshals typed results back. The
//! connection lives behind a mutex and all statement work runs on the
//! blocking pool, so the async transport tasks never stall on SQLite.
//!
//! # Contract
//!
//! - `query` always yields a row sequence - zero matches is an empty
//!   vector, never null.
//! - `execute` results are backend-defined (rows for row-returning
//!   statements, a rows-affected object otherwise) and pass through the
//!   gateway uninspected.
//! - `transaction` is all-or-nothing: any failing operation rolls back
//!   every prior one, and result order mirrors operation order.

pub mod schema;

use crate::error::DatastoreError;
use crate::wire::{DbRequest, QueryMethod};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, Row, params_from_iter};
use serde_json::{Map, Value, json};
use tokio::task::spawn_blocking;

/// Embedded SQLite store for the workforce tables.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct Datastore {
    conn: Arc<Mutex<Connection>>,
}

impl Datastore {
    /// Open (or create) the database file and enable foreign keys.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DatastoreError> {
        let path = path.as_ref().to_owned();
        let conn = spawn_blocking(move || -> Result<Connection, DatastoreError> {
            let conn = Connection::open(path)?;
            configure(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests and ephemeral sessions.
    pub async fn open_in_memory() -> Result<Self, DatastoreError> {
        let conn = spawn_blocking(|| -> Result<Connection, DatastoreError> {
            let conn = Connection::open_in_memory()?;
            configure(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Apply the workforce schema. Idempotent.
    pub async fn migrate(&self) -> Result<(), DatastoreError> {
        self.with_conn(|conn| {
            for statement in schema::MIGRATIONS {
                conn.execute_batch(statement)?;
            }
            Ok(())
        })
        .await
    }

    /// Read-style dispatch: interpret `method` against `table`.
    ///
    /// The result is a sequence of records - possibly empty, never null.
    pub async fn query(
        &self,
        table: String,
        method: QueryMethod,
        args: Vec<Value>,
    ) -> Result<Vec<Value>, DatastoreError> {
        self.with_conn(move |conn| run_query(conn, &table, method, &args))
            .await
    }

    /// Raw parameterized statement. The result shape is backend-defined.
    pub async fn execute(
        &self,
        sql: String,
        params: Vec<Value>,
    ) -> Result<Value, DatastoreError> {
        self.with_conn(move |conn| run_execute(conn, &sql, &params))
            .await
    }

    /// Run the ordered operation list atomically.
    ///
    /// `result[i]` corresponds to `ops[i]`. Any failure rolls the whole
    /// batch back and nothing is persisted.
    pub async fn transaction(
        &self,
        ops: Vec<DbRequest>,
    ) -> Result<Vec<Value>, DatastoreError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut results = Vec::with_capacity(ops.len());
            for op in &ops {
                results.push(apply_request(&tx, op)?);
            }

            tx.commit()?;
            Ok(results)
        })
        .await
    }

    /// Run `job` with the connection on the blocking pool.
    async fn with_conn<T, F>(&self, job: F) -> Result<T, DatastoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatastoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DatastoreError::Worker {
                message: "connection mutex poisoned".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
            job(&mut guard)
        })
        .await
        .map_err(join_error)?
    }
}

#[track_caller]
fn join_error(error: tokio::task::JoinError) -> DatastoreError {
    DatastoreError::Worker {
        message: format!("blocking worker failed: {error}"),
        location: ErrorLocation::from(Location::caller()),
    }
}

fn configure(conn: &Connection) -> Result<(), DatastoreError> {
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    Ok(())
}

/// Apply one transaction operation. Query results are wrapped in an array
/// value so the ordered result list has a uniform element shape.
fn apply_request(conn: &Connection, request: &DbRequest) -> Result<Value, DatastoreError> {
    match request {
        DbRequest::Query {
            table,
            method,
            args,
        } => run_query(conn, table, *method, args).map(Value::Array),
        DbRequest::Execute { sql, params } => run_execute(conn, sql, params),
    }
}

fn run_query(
    conn: &Connection,
    table: &str,
    method: QueryMethod,
    args: &[Value],
) -> Result<Vec<Value>, DatastoreError> {
    if !schema::is_known_table(table) {
        return Err(DatastoreError::UnknownTable {
            table: table.to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    match method {
        QueryMethod::FindAll => {
            expect_arity(table, args, 0)?;
            select_rows(conn, &format!("SELECT * FROM {table}"), &[])
        }
        QueryMethod::FindById => {
            expect_arity(table, args, 1)?;
            let id = scalar_id(table, &args[0])?;
            select_rows(
                conn,
                &format!("SELECT * FROM {table} WHERE id = ?1"),
                &[id],
            )
        }
        QueryMethod::FindWhere => {
            expect_arity(table, args, 1)?;
            let fields = record_fields(conn, table, &args[0])?;
            if fields.is_empty() {
                return select_rows(conn, &format!("SELECT * FROM {table}"), &[]);
            }

            let clause = fields
                .iter()
                .enumerate()
                .map(|(index, (name, _))| format!("{name} = ?{}", index + 1))
                .collect::<Vec<_>>()
                .join(" AND ");
            let params: Vec<SqlValue> =
                fields.into_iter().map(|(_, value)| value).collect();

            select_rows(
                conn,
                &format!("SELECT * FROM {table} WHERE {clause}"),
                &params,
            )
        }
        QueryMethod::Insert => {
            expect_arity(table, args, 1)?;
            let fields = record_fields(conn, table, &args[0])?;
            if fields.is_empty() {
                return Err(invalid_arguments(format!(
                    "insert into '{table}' requires a non-empty record"
                )));
            }

            let names = fields
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = (1..=fields.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            let params: Vec<SqlValue> =
                fields.into_iter().map(|(_, value)| value).collect();

            conn.prepare(&format!(
                "INSERT INTO {table} ({names}) VALUES ({placeholders})"
            ))?
            .execute(params_from_iter(params))?;

            // Hand back the stored row, generated id included.
            let rowid = conn.last_insert_rowid();
            select_rows(
                conn,
                &format!("SELECT * FROM {table} WHERE rowid = ?1"),
                &[SqlValue::Integer(rowid)],
            )
        }
        QueryMethod::Update => {
            expect_arity(table, args, 2)?;
            let id = scalar_id(table, &args[0])?;
            let fields = record_fields(conn, table, &args[1])?;
            if fields.is_empty() {
                return Err(invalid_arguments(format!(
                    "update of '{table}' requires a non-empty patch"
                )));
            }

            let assignments = fields
                .iter()
                .enumerate()
                .map(|(index, (name, _))| format!("{name} = ?{}", index + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let mut params: Vec<SqlValue> =
                fields.into_iter().map(|(_, value)| value).collect();
            let id_slot = params.len() + 1;
            params.push(id.clone());

            conn.prepare(&format!(
                "UPDATE {table} SET {assignments} WHERE id = ?{id_slot}"
            ))?
            .execute(params_from_iter(params))?;

            select_rows(
                conn,
                &format!("SELECT * FROM {table} WHERE id = ?1"),
                &[id],
            )
        }
        QueryMethod::Delete => {
            expect_arity(table, args, 1)?;
            let id = scalar_id(table, &args[0])?;

            // Return the rows being removed, keeping the record-sequence
            // contract uniform across verbs.
            let removed = select_rows(
                conn,
                &format!("SELECT * FROM {table} WHERE id = ?1"),
                &[id.clone()],
            )?;
            conn.prepare(&format!("DELETE FROM {table} WHERE id = ?1"))?
                .execute(params_from_iter([id]))?;

            Ok(removed)
        }
    }
}

fn run_execute(
    conn: &Connection,
    sql: &str,
    params: &[Value],
) -> Result<Value, DatastoreError> {
    let bound: Vec<SqlValue> = params.iter().map(to_sql_value).collect();
    let mut statement = conn.prepare(sql)?;

    if statement.column_count() > 0 {
        let columns: Vec<String> = statement
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = statement.query(params_from_iter(bound))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row_to_json(row, &columns)?);
        }
        Ok(Value::Array(out))
    } else {
        let affected = statement.execute(params_from_iter(bound))?;
        Ok(json!({ "rowsAffected": affected }))
    }
}

fn select_rows(
    conn: &Connection,
    sql: &str,
    params: &[SqlValue],
) -> Result<Vec<Value>, DatastoreError> {
    let mut statement = conn.prepare(sql)?;
    let columns: Vec<String> = statement
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = statement.query(params_from_iter(params.iter().cloned()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row_to_json(row, &columns)?);
    }
    Ok(out)
}

fn row_to_json(row: &Row<'_>, columns: &[String]) -> Result<Value, DatastoreError> {
    let mut object = Map::new();
    for (index, name) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(int) => Value::from(int),
            ValueRef::Real(real) => Value::from(real),
            ValueRef::Text(text) => {
                Value::String(String::from_utf8_lossy(text).into_owned())
            }
            ValueRef::Blob(blob) => {
                Value::Array(blob.iter().map(|byte| Value::from(*byte)).collect())
            }
        };
        object.insert(name.clone(), value);
    }
    Ok(Value::Object(object))
}

/// Column names of `table`, read from SQLite itself so validation never
/// drifts from the migrated schema.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, DatastoreError> {
    let mut statement = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let mut rows = statement.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

/// Validate a record/filter object against the table's columns and bind
/// its values. Keys outside the schema are rejected, never interpolated.
fn record_fields(
    conn: &Connection,
    table: &str,
    value: &Value,
) -> Result<Vec<(String, SqlValue)>, DatastoreError> {
    let Value::Object(object) = value else {
        return Err(invalid_arguments(format!(
            "'{table}' record must be an object, got {}",
            type_name(value)
        )));
    };

    let columns = table_columns(conn, table)?;
    let mut fields = Vec::with_capacity(object.len());
    for (name, field) in object {
        if !columns.contains(name) {
            return Err(DatastoreError::UnknownColumn {
                table: table.to_string(),
                column: name.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        fields.push((name.clone(), to_sql_value(field)));
    }
    Ok(fields)
}

fn scalar_id(table: &str, value: &Value) -> Result<SqlValue, DatastoreError> {
    match value {
        Value::Number(_) | Value::String(_) => Ok(to_sql_value(value)),
        other => Err(invalid_arguments(format!(
            "'{table}' id must be a number or string, got {}",
            type_name(other)
        ))),
    }
}

fn expect_arity(table: &str, args: &[Value], expected: usize) -> Result<(), DatastoreError> {
    if args.len() != expected {
        return Err(invalid_arguments(format!(
            "query on '{table}' expected {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

#[track_caller]
fn invalid_arguments(message: String) -> DatastoreError {
    DatastoreError::InvalidArguments {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// JSON -> SQLite binding. Composite values are stored as serialized JSON
/// text; booleans as 0/1.
fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                SqlValue::Integer(int)
            } else {
                SqlValue::Real(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(text) => SqlValue::Text(text.clone()),
        composite => SqlValue::Text(composite.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
