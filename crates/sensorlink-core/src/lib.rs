//! # SensorLink Core Library
//!
//! Core functionality for the SensorLink telemetry monitor.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - UDP datagram reception and decoding of sensor board telemetry
//! - A bounded rolling window of recent readings
//! - Live derived values (ΔT, elapsed test time) and window statistics
//! - Operator event tagging
//! - Append-only CSV session logs
//! - Online/offline detection
//!
//! ## Wire format
//!
//! One UDP datagram per sample, UTF-8 text:
//! `ambient_temp,humidity,pressure,thermistor1,thermistor2`
//!
//! ## Example
//!
//! ```rust,ignore
//! use sensorlink_core::prelude::*;
//!
//! let mut monitor = Monitor::start(MonitorConfig::default()).await?;
//! let mut updates = monitor.subscribe();
//!
//! monitor.handle_command(EventCommand::StartTest);
//! loop {
//!     if let StepOutcome::Accepted(reading) = monitor.step().await {
//!         println!("ΔT: {} °C", reading.delta());
//!     }
//! }
//! ```

pub mod config;
pub mod datalog;
pub mod demo;
pub mod link;
pub mod monitor;
pub mod reading;
pub mod session;
pub mod stats;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::MonitorConfig;
    pub use crate::datalog::{ColumnLayout, CsvLog, RollingWindow};
    pub use crate::link::{ConnectionState, ConnectivityMonitor, DatagramReceiver, DecodeError};
    pub use crate::monitor::{Monitor, MonitorRequest, MonitorSnapshot, SessionReport, StepOutcome};
    pub use crate::reading::{Channel, Reading, SensorSample};
    pub use crate::session::{EventCommand, Session};
    pub use crate::stats::{ChannelStats, WindowSummary};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
