//! Data Logging
//!
//! Keeps the rolling in-memory window and appends every reading to the
//! session's CSV log.

pub mod format;
mod window;
mod writer;

pub use format::{window_to_csv, ColumnLayout};
pub use window::{RollingWindow, DEFAULT_CAPACITY};
pub use writer::{CsvLog, LogError};
