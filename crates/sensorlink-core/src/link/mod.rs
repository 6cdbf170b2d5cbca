//! UDP Link
//!
//! Receives datagrams from the sensor board, decodes them into readings and
//! tracks whether the board is still talking to us.
//!
//! The board speaks a plain ASCII protocol: one datagram per sample, five
//! comma-separated decimal numbers, no sequence numbers and no acknowledgement.

pub mod connectivity;
pub mod decoder;
mod error;
mod receiver;

pub use connectivity::{ConnectionState, ConnectivityMonitor};
pub use decoder::{decode, parse_payload};
pub use error::{DecodeError, LinkError};
pub use receiver::{DatagramReceiver, Incoming};

/// Default UDP port the sensor board sends to
pub const DEFAULT_PORT: u16 = 5005;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5005";

/// Largest datagram the board is expected to send
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Default receive poll timeout in milliseconds
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Default offline threshold in milliseconds
pub const DEFAULT_OFFLINE_THRESHOLD_MS: u64 = 2000;
