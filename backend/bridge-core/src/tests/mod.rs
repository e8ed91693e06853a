mod channel;
mod client;
mod pending;
mod wire;
