//! IPC transport for the registration endpoint
//!
//! Client processes reach the observer over a Unix domain socket using
//! length-delimited bincode frames.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::PingClient;
pub use protocol::{IpcMessage, RequestMessage, RequestPayload, ResponseMessage, ResponsePayload};
pub use server::PingServer;
