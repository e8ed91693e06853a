//! Bridge endpoint info published for the UI process.
//!
//! The renderer bundle cannot guess the bound port or the handshake
//! token, so the shell drops both in `{data_dir}/bridge-endpoint.json`
//! after the host starts. Written atomically so the UI never reads a
//! half-written file.

use crate::error::StaffdeskError;

use common::{ErrorLocation, RedactedToken};

use std::panic::Location;
use std::path::Path;

use log::info;
use serde_json::json;

const ENDPOINT_FILE_NAME: &str = "bridge-endpoint.json";

/// Where the UI process finds the running bridge.
pub struct EndpointInfo {
    port: u16,
    token: RedactedToken,
}

impl EndpointInfo {
    pub fn new(port: u16, token: RedactedToken) -> Self {
        Self { port, token }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// File the endpoint info is published to, under `data_dir`.
    pub fn path_in(data_dir: &Path) -> std::path::PathBuf {
        data_dir.join(ENDPOINT_FILE_NAME)
    }

    /// Publish the endpoint file. The token is written deliberately via
    /// `as_str`; `RedactedToken` itself refuses serialization.
    pub fn save(&self, data_dir: &Path) -> Result<(), StaffdeskError> {
        let endpoint_path = Self::path_in(data_dir);
        let temp_path = data_dir.join(format!("{}.tmp", ENDPOINT_FILE_NAME));

        let payload = json!({
            "port": self.port,
            "token": self.token.as_str(),
        });

        std::fs::write(&temp_path, payload.to_string()).map_err(|e| {
            StaffdeskError::Staffdesk {
                message: format!("Failed to write endpoint file: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        std::fs::rename(&temp_path, &endpoint_path).map_err(|e| StaffdeskError::Staffdesk {
            message: format!("Failed to publish endpoint file: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Bridge endpoint published to {}", endpoint_path.display());
        Ok(())
    }
}
