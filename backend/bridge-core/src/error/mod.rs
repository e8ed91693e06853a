pub mod bridge;
pub mod datastore;
pub mod host;

pub use bridge::BridgeError;
pub use datastore::DatastoreError;
pub use host::HostError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Host(#[from] host::HostError),

    #[error(transparent)]
    Datastore(#[from] datastore::DatastoreError),
}
