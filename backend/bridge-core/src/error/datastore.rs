use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors raised by the host datastore behind the db channels.
#[derive(Debug, ThisError)]
pub enum DatastoreError {
    /// The named table is not part of the workforce schema. Table names
    /// are validated before any SQL is assembled.
    #[error("Unknown Table: '{table}' {location}")]
    UnknownTable {
        table: String,
        location: ErrorLocation,
    },

    /// A filter or record referenced a column the table does not have.
    #[error("Unknown Column: '{table}.{column}' {location}")]
    UnknownColumn {
        table: String,
        column: String,
        location: ErrorLocation,
    },

    /// The operation arguments did not match the method's contract
    /// (wrong arity, non-object record, non-scalar id).
    #[error("Invalid Arguments: {message} {location}")]
    InvalidArguments {
        message: String,
        location: ErrorLocation,
    },

    /// SQLite rejected the statement (constraint violation, syntax error,
    /// locked database).
    #[error("Sqlite Error: {message} {location}")]
    Sqlite {
        message: String,
        location: ErrorLocation,
    },

    /// The blocking worker running the statement went away.
    #[error("Worker Error: {message} {location}")]
    Worker {
        message: String,
        location: ErrorLocation,
    },
}

impl From<rusqlite::Error> for DatastoreError {
    #[track_caller]
    fn from(error: rusqlite::Error) -> Self {
        DatastoreError::Sqlite {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
