//! Online/offline detection
//!
//! Derived purely from the time since the last good datagram; the monitor
//! keeps no state of its own besides the threshold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Link state shown to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Datagrams are arriving
    Online,
    /// No datagram yet, or none within the threshold
    Offline,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Online => f.write_str("ONLINE"),
            ConnectionState::Offline => f.write_str("OFFLINE"),
        }
    }
}

/// Maps "time since last packet" to a [`ConnectionState`]
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityMonitor {
    threshold: Duration,
}

impl ConnectivityMonitor {
    /// Create a monitor going offline after `threshold` of silence
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Offline threshold
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Evaluate the link state at `now`
    pub fn state(&self, last_seen: Option<Instant>, now: Instant) -> ConnectionState {
        match last_seen {
            Some(seen) if now.saturating_duration_since(seen) <= self.threshold => {
                ConnectionState::Online
            }
            _ => ConnectionState::Offline,
        }
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(Duration::from_millis(super::DEFAULT_OFFLINE_THRESHOLD_MS))
    }
}
