//! Monitor loop
//!
//! Ties the link, session, rolling window and log together in a single
//! cooperative loop:
//!
//! 1. handle queued operator requests,
//! 2. poll the socket for at most the poll timeout,
//! 3. on a datagram: decode, store, log and publish a fresh snapshot,
//! 4. on a timeout: re-evaluate connectivity and publish if it changed.
//!
//! Everything runs on the loop's task, so the session and window need no
//! locking. Other tasks observe the monitor through immutable
//! [`MonitorSnapshot`]s published on a `watch` channel.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{ConfigError, MonitorConfig};
use crate::datalog::{window_to_csv, CsvLog, RollingWindow};
use crate::link::{
    decode, ConnectionState, ConnectivityMonitor, DatagramReceiver, DecodeError, Incoming,
    LinkError,
};
use crate::reading::Reading;
use crate::session::{EventCommand, Session};
use crate::stats::{format_elapsed, WindowSummary};

/// Errors that prevent the monitor from starting
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Socket could not be bound
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Log directory could not be created
    #[error("Failed to prepare log directory {path}: {source}")]
    LogDir {
        /// Directory that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Requests from the presentation layer, handled between loop iterations
#[derive(Debug)]
pub enum MonitorRequest {
    /// Apply an event command
    Annotate(EventCommand),
    /// Serialize the current window to CSV
    ExportWindow(oneshot::Sender<Vec<u8>>),
    /// Read back the full session log
    ExportLog(oneshot::Sender<io::Result<Vec<u8>>>),
}

/// What a single loop iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A reading was accepted
    Accepted(Reading),
    /// A datagram arrived but could not be decoded
    Rejected(DecodeError),
    /// Nothing arrived within the poll timeout
    Idle,
    /// The socket reported an error
    ReceiveFailed,
}

/// Everything a presentation layer needs to render the live view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Session id
    pub session_id: Uuid,
    /// Log file of this session
    pub log_path: PathBuf,
    /// Most recent reading
    pub latest: Option<Reading>,
    /// ΔT of the most recent reading
    pub delta: Option<f64>,
    /// Rolling window, oldest first
    pub window: Vec<Reading>,
    /// Statistics over the window
    pub summary: WindowSummary,
    /// Link state
    pub connection: ConnectionState,
    /// Current event tag
    pub event_tag: String,
    /// Elapsed test time as `H:MM:SS`
    pub elapsed: String,
    /// Whether a test clock is running
    pub test_running: bool,
    /// Accepted readings
    pub packet_count: u64,
    /// Rejected datagrams
    pub decode_errors: u64,
    /// Log rows lost to write failures
    pub dropped_rows: u64,
    /// Last sender address
    pub last_sender: Option<SocketAddr>,
    /// Most recent non-fatal error, for the status area
    pub last_error: Option<String>,
    /// When this snapshot was taken
    pub taken_at: DateTime<Local>,
}

/// Totals reported at shutdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session id
    pub session_id: Uuid,
    /// Log file of this session
    pub log_path: PathBuf,
    /// Accepted readings
    pub packet_count: u64,
    /// Rejected datagrams
    pub decode_errors: u64,
    /// Rows written to the log
    pub rows_written: u64,
    /// Rows lost to write failures
    pub dropped_rows: u64,
}

/// The telemetry monitor
pub struct Monitor {
    config: MonitorConfig,
    receiver: DatagramReceiver,
    session: Session,
    window: RollingWindow,
    log: CsvLog,
    connectivity: ConnectivityMonitor,
    connection: ConnectionState,
    last_error: Option<String>,
    publisher: watch::Sender<Arc<MonitorSnapshot>>,
}

impl Monitor {
    /// Bind the socket and start a new session
    ///
    /// A bind failure is fatal: without its socket the monitor has nothing
    /// to do.
    pub async fn start(config: MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;

        let session = Session::create(&config.log_dir, Local::now()).map_err(|source| {
            MonitorError::LogDir {
                path: config.log_dir.clone(),
                source,
            }
        })?;
        let receiver = DatagramReceiver::bind(&config.bind_addr).await?;

        tracing::info!(
            "Session {} started, logging to {}",
            session.id(),
            session.log_path().display()
        );

        let log = CsvLog::new(session.log_path(), config.column_layout());
        let window = RollingWindow::new(config.window_capacity);
        let connectivity = ConnectivityMonitor::new(config.offline_threshold());
        let (publisher, _) = watch::channel(Arc::new(placeholder_snapshot()));

        let mut monitor = Self {
            config,
            receiver,
            session,
            window,
            log,
            connectivity,
            connection: ConnectionState::Offline,
            last_error: None,
            publisher,
        };
        monitor.publish();
        Ok(monitor)
    }

    /// Configuration in use
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current rolling window
    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Current link state
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, LinkError> {
        self.receiver.local_addr()
    }

    /// Subscribe to published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.publisher.subscribe()
    }

    /// Run one iteration: poll, then process whatever arrived
    pub async fn step(&mut self) -> StepOutcome {
        match self.receiver.poll(self.config.poll_timeout()).await {
            Ok(Incoming::Datagram { payload, from }) => self.ingest(&payload, from),
            Ok(Incoming::Timeout) => {
                self.refresh_connectivity();
                StepOutcome::Idle
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.last_error = Some(e.to_string());
                self.refresh_connectivity();
                StepOutcome::ReceiveFailed
            }
        }
    }

    /// Process one datagram from `from`
    pub fn ingest(&mut self, payload: &[u8], from: SocketAddr) -> StepOutcome {
        let now = Local::now();
        let reading = match decode(payload, &self.session, now) {
            Ok(reading) => reading,
            Err(e) => {
                self.session.record_decode_error();
                tracing::warn!("Dropping datagram from {}: {}", from, e);
                self.last_error = Some(format!("Malformed datagram from {}: {}", from, e));
                // Garbage is not contact; the board may have gone quiet
                self.derive_connection();
                self.publish();
                return StepOutcome::Rejected(e);
            }
        };

        tracing::debug!(
            "Reading from {}: th1={} th2={} delta={}",
            from,
            reading.thermistor1(),
            reading.thermistor2(),
            reading.delta()
        );

        self.session.record_packet(from, Instant::now());
        self.window.append(reading.clone());
        if !self.log.append(&reading) {
            self.last_error = self.log.last_error().map(str::to_string);
        }

        if self.connection == ConnectionState::Offline {
            tracing::info!("Sensor board online ({})", from);
        }
        self.connection = ConnectionState::Online;
        self.publish();

        StepOutcome::Accepted(reading)
    }

    /// Re-evaluate the link state, publishing on change
    pub fn refresh_connectivity(&mut self) -> ConnectionState {
        if self.derive_connection() {
            self.publish();
        }
        self.connection
    }

    /// Recompute the link state from the last accepted reading, returning
    /// whether it changed
    fn derive_connection(&mut self) -> bool {
        let state = self
            .connectivity
            .state(self.session.last_seen(), Instant::now());
        if state == self.connection {
            return false;
        }
        if state == ConnectionState::Offline {
            tracing::warn!(
                "No telemetry for more than {:?}, sensor board offline",
                self.connectivity.threshold()
            );
        }
        self.connection = state;
        true
    }

    /// Apply an operator event command
    pub fn handle_command(&mut self, command: EventCommand) {
        self.session.apply(command, Local::now());
        self.publish();
    }

    /// Handle a presentation-layer request
    pub fn handle_request(&mut self, request: MonitorRequest) {
        match request {
            MonitorRequest::Annotate(command) => self.handle_command(command),
            MonitorRequest::ExportWindow(reply) => {
                let _ = reply.send(self.export_window());
            }
            MonitorRequest::ExportLog(reply) => {
                let _ = reply.send(self.export_log());
            }
        }
    }

    /// Current window as CSV bytes
    pub fn export_window(&self) -> Vec<u8> {
        window_to_csv(&self.window.snapshot(), self.log.layout())
    }

    /// Full session log as CSV bytes
    pub fn export_log(&self) -> io::Result<Vec<u8>> {
        self.log.read_all()
    }

    /// Build a snapshot of the current state
    pub fn snapshot(&self) -> MonitorSnapshot {
        let now = Local::now();
        let window = self.window.snapshot();
        let latest = self.window.latest().cloned();
        let elapsed = self.session.elapsed(now);

        MonitorSnapshot {
            session_id: self.session.id(),
            log_path: self.session.log_path().to_path_buf(),
            delta: latest.as_ref().map(Reading::delta),
            latest,
            summary: WindowSummary::compute(&window),
            window,
            connection: self.connection,
            event_tag: self.session.event_tag().to_string(),
            elapsed: format_elapsed(elapsed),
            test_running: elapsed.is_some(),
            packet_count: self.session.packet_count(),
            decode_errors: self.session.decode_errors(),
            dropped_rows: self.log.dropped_rows(),
            last_sender: self.session.last_sender(),
            last_error: self.last_error.clone(),
            taken_at: now,
        }
    }

    fn publish(&mut self) {
        self.publisher.send_replace(Arc::new(self.snapshot()));
    }

    /// Run until `cancel` fires, then shut down
    ///
    /// Requests are drained before every poll, so they are handled within
    /// one poll timeout of being sent.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<MonitorRequest>,
        cancel: CancellationToken,
    ) -> SessionReport {
        let idle_sleep = self.config.idle_sleep();

        loop {
            while let Ok(request) = requests.try_recv() {
                self.handle_request(request);
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.step() => {}
            }

            if !idle_sleep.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(idle_sleep) => {}
                }
            }
        }

        self.shutdown()
    }

    /// Close the socket and the log and report session totals
    pub fn shutdown(self) -> SessionReport {
        let Monitor {
            receiver,
            session,
            log,
            ..
        } = self;

        receiver.close();
        let (rows_written, dropped_rows) = log.close();

        let report = SessionReport {
            session_id: session.id(),
            log_path: session.log_path().to_path_buf(),
            packet_count: session.packet_count(),
            decode_errors: session.decode_errors(),
            rows_written,
            dropped_rows,
        };
        tracing::info!(
            "Session {} finished: {} readings, {} rejected, {} log rows dropped",
            report.session_id,
            report.packet_count,
            report.decode_errors,
            report.dropped_rows
        );
        report
    }
}

/// Snapshot used until the monitor publishes its first real one
fn placeholder_snapshot() -> MonitorSnapshot {
    MonitorSnapshot {
        session_id: Uuid::nil(),
        log_path: PathBuf::new(),
        latest: None,
        delta: None,
        window: Vec::new(),
        summary: WindowSummary::default(),
        connection: ConnectionState::Offline,
        event_tag: String::new(),
        elapsed: format_elapsed(None),
        test_running: false,
        packet_count: 0,
        decode_errors: 0,
        dropped_rows: 0,
        last_sender: None,
        last_error: None,
        taken_at: Local::now(),
    }
}
