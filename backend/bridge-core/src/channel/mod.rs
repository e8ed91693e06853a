//! Channel capability table (allow-list) for the bridge.
//!
//! Every channel the bridge will carry is named here, literally, together
//! with the directions it permits. The table is closed-world: a channel
//! that is not listed is rejected at whichever entry point sees it first
//! (client gateway or host dispatcher), and the request never reaches the
//! transport.
//!
//! # Security
//!
//! The UI process is less trusted than the host. This table is the sole
//! authorization boundary between them, so every entry point - `send`,
//! `on`, `invoke` on the client and the dispatcher on the host - consults
//! the same table instead of keeping its own list. Extending the surface
//! means adding a literal name here; there is no pattern matching.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Generic application message channel (renderer -> host notifications and
/// host -> renderer broadcasts).
pub const EXAMPLE_CHANNEL: &str = "example-channel";

/// Structured read-style dispatch against a named table.
pub const DB_QUERY: &str = "db:query";
/// Raw parameterized statement.
pub const DB_EXECUTE: &str = "db:execute";
/// Ordered, all-or-nothing operation list.
pub const DB_TRANSACTION: &str = "db:transaction";

pub const WINDOW_MINIMIZE: &str = "window:minimize";
pub const WINDOW_MAXIMIZE: &str = "window:maximize";
pub const WINDOW_UNMAXIMIZE: &str = "window:unmaximize";
pub const WINDOW_CLOSE: &str = "window:close";
pub const WINDOW_IS_MAXIMIZED: &str = "window:is-maximized";

/// One direction of communication a channel may permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    /// Renderer -> host, fire-and-forget, no acknowledgment.
    Send,
    /// Renderer -> host request with exactly one correlated response.
    Invoke,
    /// Host -> renderer event stream.
    Event,
}

/// A named channel and the directions it permits.
#[derive(Debug, Clone)]
pub struct ChannelCapability {
    pub name: &'static str,
    pub directions: &'static [ChannelDirection],
}

use ChannelDirection::{Event, Invoke, Send};

/// The static allow-list. Default deny: anything not in this table is
/// rejected before it touches the transport.
static DEFAULT_TABLE: Lazy<Vec<ChannelCapability>> = Lazy::new(|| {
    vec![
        ChannelCapability {
            name: EXAMPLE_CHANNEL,
            directions: &[Send, Event],
        },
        ChannelCapability {
            name: DB_QUERY,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: DB_EXECUTE,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: DB_TRANSACTION,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: WINDOW_MINIMIZE,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: WINDOW_MAXIMIZE,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: WINDOW_UNMAXIMIZE,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: WINDOW_CLOSE,
            directions: &[Invoke],
        },
        ChannelCapability {
            name: WINDOW_IS_MAXIMIZED,
            directions: &[Invoke],
        },
    ]
});

/// The capability table consulted by every bridge entry point.
///
/// Cloning is cheap enough for startup wiring; at runtime the table is
/// shared behind an `Arc` and never mutated.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    entries: HashMap<String, Vec<ChannelDirection>>,
}

impl ChannelRegistry {
    /// The production table: `example-channel` plus the db and
    /// window-control channel sets.
    pub fn default_table() -> Self {
        Self::with_capabilities(&DEFAULT_TABLE)
    }

    /// Build a registry from an explicit capability list.
    pub fn with_capabilities(capabilities: &[ChannelCapability]) -> Self {
        let entries = capabilities
            .iter()
            .map(|capability| {
                (
                    capability.name.to_string(),
                    capability.directions.to_vec(),
                )
            })
            .collect();

        Self { entries }
    }

    /// Whether `channel` may be used in `direction`. Unknown names are
    /// always denied.
    pub fn is_allowed(&self, channel: &str, direction: ChannelDirection) -> bool {
        self.entries
            .get(channel)
            .is_some_and(|directions| directions.contains(&direction))
    }

    /// Whether `channel` exists in the table at all, in any direction.
    pub fn is_known(&self, channel: &str) -> bool {
        self.entries.contains_key(channel)
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::default_table()
    }
}
