//! Window-control gateway.
//!
//! Each call is a thin invoke into the host's window manager, guarded by
//! the inside-the-shell check: detached (plain-browser development) runs
//! turn mutating calls into no-ops and `is_maximized` into a fixed
//! `false`, so UI code never has to assume host capabilities exist.

use crate::channel;
use crate::client::Bridge;
use crate::error::BridgeError;

use common::ErrorLocation;

use std::panic::Location;

use log::{debug, warn};
use serde_json::Value;

/// Window controls reachable from the renderer.
pub struct WindowGateway {
    bridge: Bridge,
}

impl WindowGateway {
    pub(crate) fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub async fn minimize(&self) {
        self.control(channel::WINDOW_MINIMIZE).await;
    }

    pub async fn maximize(&self) {
        self.control(channel::WINDOW_MAXIMIZE).await;
    }

    pub async fn unmaximize(&self) {
        self.control(channel::WINDOW_UNMAXIMIZE).await;
    }

    pub async fn close(&self) {
        self.control(channel::WINDOW_CLOSE).await;
    }

    /// Whether the host window is maximized. Outside the host shell this
    /// resolves `false` without touching any transport.
    pub async fn is_maximized(&self) -> Result<bool, BridgeError> {
        if !self.bridge.is_attached() {
            return Ok(false);
        }

        let value = self
            .bridge
            .invoke(channel::WINDOW_IS_MAXIMIZED, Vec::new())
            .await?;
        match value {
            Value::Bool(maximized) => Ok(maximized),
            other => Err(BridgeError::Decode {
                message: format!("host returned a non-boolean window state: {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Mutating controls surface no result to the caller; failures are
    /// logged and swallowed.
    async fn control(&self, channel: &str) {
        if !self.bridge.is_attached() {
            debug!("Window control '{channel}' ignored outside the host shell");
            return;
        }

        if let Err(error) = self.bridge.invoke(channel, Vec::new()).await {
            warn!("Window control '{channel}' failed: {error}");
        }
    }
}
