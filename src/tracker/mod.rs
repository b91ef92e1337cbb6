//! Tracker side of the client
//!
//! - `protocol`: line codec for commands and responses
//! - `taxonomy`: `ERR` codes to error kinds
//! - `connection`: one socket to one tracker
//! - `client`: failover across trackers and the request/response exchange

pub mod client;
pub mod connection;
pub mod protocol;
pub mod taxonomy;

pub use client::TrackerClient;
pub use connection::TrackerConnection;
pub use protocol::{Command, FileLocation, Fields, Response};
