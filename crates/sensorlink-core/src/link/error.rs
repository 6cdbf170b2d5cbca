//! Link errors

use std::io;
use thiserror::Error;

/// Errors raised by the datagram receiver
#[derive(Error, Debug)]
pub enum LinkError {
    /// The port is taken or not permitted
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        /// Requested address
        addr: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The bind address does not parse as `ip:port`
    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    /// The socket reported an error while receiving
    #[error("UDP receive error: {0}")]
    Receive(#[from] io::Error),
}

/// Reasons a datagram could not be turned into a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload exceeds the datagram size limit
    #[error("Datagram too large: {size} bytes (max {max})")]
    TooLarge {
        /// Received size
        size: usize,
        /// Allowed size
        max: usize,
    },

    /// Payload is not text
    #[error("Payload is not valid UTF-8")]
    InvalidUtf8,

    /// Wrong number of comma-separated fields
    #[error("Expected {expected} fields, got {actual}")]
    FieldCount {
        /// Fields in the wire format
        expected: usize,
        /// Fields received
        actual: usize,
    },

    /// A field does not parse as a number
    #[error("Field {index} ({column}) is not a number: '{value}'")]
    InvalidNumber {
        /// Zero-based field position
        index: usize,
        /// Log column of the field
        column: &'static str,
        /// Offending text
        value: String,
    },

    /// A field is NaN or infinite
    #[error("Field {index} ({column}) is not finite")]
    NonFinite {
        /// Zero-based field position
        index: usize,
        /// Log column of the field
        column: &'static str,
    },
}
