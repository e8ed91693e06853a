use crate::config::ConfigError;

use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while wiring and running the host shell.
///
/// These errors are serializable so the shell can surface them to the UI
/// process; structured location tracking is kept internally.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StaffdeskError {
    /// Error from this app's own wiring (directories, logger, shutdown)
    #[error("Staffdesk Error: {message} {location}")]
    Staffdesk {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bridge-core operations (datastore, bridge host)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Error loading or saving the shell configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}
