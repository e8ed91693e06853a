//! Per-connection authentication state.

/// Tracks whether a connection has completed the token handshake.
pub(crate) struct ConnectionAuth {
    authenticated: bool,
    expected_token: String,
}

impl ConnectionAuth {
    pub(crate) fn new(token: String) -> Self {
        Self {
            authenticated: false,
            expected_token: token,
        }
    }

    /// Validate the presented token and mark the connection authenticated
    /// if it matches.
    pub(crate) fn validate_token(&mut self, token: &str) -> bool {
        if token == self.expected_token {
            self.authenticated = true;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
