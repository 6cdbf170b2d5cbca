//! Logging session
//!
//! One session per monitor run. The session owns the per-run mutable state:
//! the log file path, the current event tag, the test clock and the packet
//! counters. Only the monitor loop writes to it.

pub mod annotate;

pub use annotate::{EventCommand, UnknownCommand};

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Prefix of every session log file
pub const LOG_FILE_PREFIX: &str = "telemetry";

/// Build the log file name for a session created at `created`
pub fn log_file_name(created: DateTime<Local>) -> String {
    format!("{}_{}.csv", LOG_FILE_PREFIX, created.format("%Y%m%d_%H%M%S"))
}

/// State of one monitor run
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Local>,
    log_path: PathBuf,
    test_start: Option<DateTime<Local>>,
    event_tag: String,
    packet_count: u64,
    decode_errors: u64,
    last_seen: Option<Instant>,
    last_sender: Option<SocketAddr>,
}

impl Session {
    /// Create a session logging into `log_dir`
    ///
    /// The directory is created if needed. The file name embeds the creation
    /// time; if a file of that name already exists a numeric suffix is added
    /// so each run gets its own log.
    pub fn create(log_dir: &Path, created_at: DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;

        let file_name = log_file_name(created_at);
        let stem = file_name.trim_end_matches(".csv");
        let mut log_path = log_dir.join(&file_name);
        let mut suffix = 1;
        while log_path.exists() {
            log_path = log_dir.join(format!("{}_{}.csv", stem, suffix));
            suffix += 1;
        }

        Ok(Self::with_log_path(log_path, created_at))
    }

    /// Create a session writing to an explicit log path
    pub fn with_log_path(log_path: PathBuf, created_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            log_path,
            test_start: None,
            event_tag: String::new(),
            packet_count: 0,
            decode_errors: 0,
            last_seen: None,
            last_sender: None,
        }
    }

    /// Unique session id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Path of the session log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// When the current test was started, if any
    pub fn test_start(&self) -> Option<DateTime<Local>> {
        self.test_start
    }

    /// Current event tag (empty if none)
    pub fn event_tag(&self) -> &str {
        &self.event_tag
    }

    /// Number of accepted readings
    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    /// Number of datagrams rejected by the decoder
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }

    /// When the last reading was accepted
    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Address of the last sender
    pub fn last_sender(&self) -> Option<SocketAddr> {
        self.last_sender
    }

    /// Time since the test start, or `None` if no test is running
    pub fn elapsed(&self, now: DateTime<Local>) -> Option<Duration> {
        crate::stats::elapsed(self.test_start, now)
    }

    /// Apply an operator command
    pub fn apply(&mut self, command: EventCommand, now: DateTime<Local>) {
        self.event_tag = command.tag().to_string();
        match command {
            EventCommand::StartTest => self.test_start = Some(now),
            EventCommand::StopTest => self.test_start = None,
            _ => {}
        }
        tracing::info!(
            "Event '{}' applied (tag: '{}')",
            command.name(),
            self.event_tag
        );
    }

    /// Record an accepted reading from `from`
    pub fn record_packet(&mut self, from: SocketAddr, at: Instant) {
        self.packet_count += 1;
        self.last_seen = Some(at);
        self.last_sender = Some(from);
    }

    /// Record a rejected datagram
    pub fn record_decode_error(&mut self) {
        self.decode_errors += 1;
    }
}
