//! Session log writer
//!
//! Appends one CSV row per reading. The file is opened, written and closed on
//! every call, so external tools can read (or briefly lock) it while the
//! session runs and a crash loses at most the row being written.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::format::{write_header, write_row, ColumnLayout};
use crate::reading::Reading;

/// Errors writing the session log
#[derive(Error, Debug)]
pub enum LogError {
    /// The log file could not be opened or written
    #[error("Failed to write log file {path}: {source}")]
    Io {
        /// Log file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Append-only CSV log for one session
#[derive(Debug)]
pub struct CsvLog {
    path: PathBuf,
    layout: ColumnLayout,
    rows_written: u64,
    dropped_rows: u64,
    last_error: Option<String>,
}

impl CsvLog {
    /// Create a log writing to `path`; nothing is touched until the first append
    pub fn new(path: impl Into<PathBuf>, layout: ColumnLayout) -> Self {
        Self {
            path: path.into(),
            layout,
            rows_written: 0,
            dropped_rows: 0,
            last_error: None,
        }
    }

    /// Log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column layout
    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    /// Rows successfully written this session
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows skipped because the file could not be written
    pub fn dropped_rows(&self) -> u64 {
        self.dropped_rows
    }

    /// Description of the most recent write failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Append a reading, skipping it if the file is unavailable
    ///
    /// Returns `true` if the row was written. A failure is logged and counted
    /// but never propagated; the next call simply tries again.
    pub fn append(&mut self, reading: &Reading) -> bool {
        match self.try_append(reading) {
            Ok(()) => true,
            Err(e) => {
                self.dropped_rows += 1;
                tracing::warn!("Skipping log row: {}", e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Append a reading, returning any I/O failure
    ///
    /// The header is written first when the file is new (or empty).
    pub fn try_append(&mut self, reading: &Reading) -> Result<(), LogError> {
        self.write_reading(reading).map_err(|source| LogError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.rows_written += 1;
        Ok(())
    }

    /// The whole row goes out in one `write_all`. If an earlier write left
    /// a partial line behind, the new row starts on a fresh line.
    fn write_reading(&self, reading: &Reading) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = Vec::with_capacity(128);
        if file.metadata()?.len() == 0 {
            write_header(&mut buf, self.layout)?;
        } else if !ends_with_newline(&mut file)? {
            buf.push(b'\n');
        }
        write_row(&mut buf, reading, self.layout)?;

        file.write_all(&buf)?;
        file.flush()
    }

    /// Read the whole log file back (for CSV export)
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        match fs::read(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            other => other,
        }
    }

    /// Finish the session log
    ///
    /// Nothing is held open between appends, so this only reports the totals.
    pub fn close(self) -> (u64, u64) {
        tracing::info!(
            "Closed log {} ({} rows written, {} dropped)",
            self.path.display(),
            self.rows_written,
            self.dropped_rows
        );
        (self.rows_written, self.dropped_rows)
    }
}

fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::SensorSample;
    use chrono::Local;

    fn reading(th1: f64) -> Reading {
        Reading::new(
            Local::now(),
            SensorSample::from_fields([25.0, 40.0, 1013.0, th1, 25.1]),
            "",
            None,
        )
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = CsvLog::new(dir.path().join("log.csv"), ColumnLayout::Standard);

        assert!(log.append(&reading(1.0)));
        assert!(log.append(&reading(2.0)));

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Time,BME_T,Hum,Pres,Th1,Th2,Event");
        assert_eq!(log.rows_written(), 2);
    }

    #[test]
    fn test_existing_file_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        CsvLog::new(&path, ColumnLayout::Standard).append(&reading(1.0));
        CsvLog::new(&path, ColumnLayout::Standard).append(&reading(2.0));

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("Time")).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_unwritable_path_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("log.csv");
        let mut log = CsvLog::new(path, ColumnLayout::Standard);

        assert!(!log.append(&reading(1.0)));
        assert_eq!(log.dropped_rows(), 1);
        assert!(log.last_error().is_some());
        assert!(log.try_append(&reading(1.0)).is_err());
    }

    #[test]
    fn test_partial_line_is_terminated_before_next_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let mut log = CsvLog::new(&path, ColumnLayout::Standard);
        assert!(log.append(&reading(1.0)));

        // A previous write was cut short mid-row
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"12:00:00,25.0,40").unwrap();
        drop(file);

        assert!(log.append(&reading(3.0)));

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "12:00:00,25.0,40");
        assert!(lines[3].ends_with(",25.0,40.0,1013.0,3.0,25.1,"));
        assert_eq!(lines[3].split(',').count(), 7);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_read_all_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("log.csv"), ColumnLayout::Standard);
        assert!(log.read_all().unwrap().is_empty());
    }
}
