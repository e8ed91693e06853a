pub mod channel;
pub mod client;
pub mod datastore;
pub mod error;
pub mod host;
pub mod wire;

#[cfg(test)]
mod tests;

pub const BRIDGE_HOSTNAME: &str = "127.0.0.1";
pub const BRIDGE_WS_BASE_URL: &str = const_format::concatcp!("ws://", BRIDGE_HOSTNAME);
pub const DEFAULT_BRIDGE_PORT: u16 = 18740;
