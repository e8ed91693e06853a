//! Bridge host handle type.

/// Handle to a running bridge host.
///
/// Returned by [`start_bridge_host`](crate::host::start_bridge_host); the
/// accept loop runs in a background task serving connections on localhost.
///
/// # Lifecycle
///
/// Dropping this handle does **not** stop the host. The transport is
/// process-lifetime-scoped and needs no explicit teardown beyond process
/// exit.
pub struct BridgeHostHandle {
    port: u16,
}

impl BridgeHostHandle {
    pub(crate) fn new(port: u16) -> Self {
        Self { port }
    }

    /// The port the host actually bound. Useful when the host was started
    /// with port 0 (ephemeral).
    pub fn port(&self) -> u16 {
        self.port
    }
}
