use crate::wire::{FaultKind, WireFault};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors surfaced by the client-side bridge gateway.
///
/// `send` and `on` never raise - disallowed channels degrade silently by
/// design. `invoke` and the db gateway always reject with one of these,
/// since callers need to branch on failure.
#[derive(Debug, ThisError)]
pub enum BridgeError {
    /// The channel is not in the capability table. Raised locally, before
    /// anything crosses the process boundary.
    #[error("Channel Not Allowed: '{channel}' {location}")]
    ChannelNotAllowed {
        channel: String,
        location: ErrorLocation,
    },

    /// The transport to the host is gone or was never there.
    #[error("Transport Failure: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// The host rejected the operation with a structured fault.
    #[error("Host Operation Error ({kind:?}): {message} {location}")]
    HostOperation {
        kind: FaultKind,
        message: String,
        location: ErrorLocation,
    },

    /// The authentication handshake failed.
    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    /// A frame could not be encoded for the transport.
    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    /// A host response did not match the expected shape.
    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },
}

impl BridgeError {
    /// Map a structured fault received from the host onto the caller-facing
    /// error type.
    #[track_caller]
    pub fn from_fault(fault: WireFault) -> Self {
        let location = ErrorLocation::from(Location::caller());
        match fault.kind {
            FaultKind::ChannelNotAllowed => BridgeError::ChannelNotAllowed {
                channel: fault.message,
                location,
            },
            kind => BridgeError::HostOperation {
                kind,
                message: fault.message,
                location,
            },
        }
    }
}
