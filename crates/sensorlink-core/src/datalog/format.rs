//! CSV log format
//!
//! Column layout: `Time, [Elapsed,] BME_T, Hum, Pres, Th1, Th2, Event`.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::reading::{Channel, Reading};
use crate::stats::format_elapsed;

/// Format of the Time column
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Column layout of a session log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Time, channels, event
    #[default]
    Standard,
    /// Time, elapsed test time, channels, event
    WithElapsed,
}

impl ColumnLayout {
    /// Column names in order
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["Time"];
        if *self == ColumnLayout::WithElapsed {
            columns.push("Elapsed");
        }
        columns.extend(Channel::ALL.iter().map(|c| c.column()));
        columns.push("Event");
        columns
    }
}

/// Format a float as plain decimal text (`25.0`, `1013.25`, `0.0000001`)
///
/// Whole numbers keep one decimal place. Exponent notation is never used so
/// spreadsheet imports see every value as a number.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Quote a field if it contains a separator, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write the header row
pub fn write_header<W: Write>(writer: &mut W, layout: ColumnLayout) -> io::Result<()> {
    writeln!(writer, "{}", layout.columns().join(","))
}

/// Write one reading as a CSV row
pub fn write_row<W: Write>(
    writer: &mut W,
    reading: &Reading,
    layout: ColumnLayout,
) -> io::Result<()> {
    write!(writer, "{}", reading.timestamp().format(TIME_FORMAT))?;
    if layout == ColumnLayout::WithElapsed {
        match reading.elapsed() {
            Some(elapsed) => write!(writer, ",{}", format_elapsed(Some(elapsed)))?,
            None => write!(writer, ",")?,
        }
    }
    for channel in Channel::ALL {
        write!(writer, ",{}", format_value(reading.get(channel)))?;
    }
    writeln!(writer, ",{}", escape_field(reading.event()))
}

/// Serialize readings (header included) to CSV bytes
pub fn window_to_csv(readings: &[Reading], layout: ColumnLayout) -> Vec<u8> {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_header(&mut out, layout);
    for reading in readings {
        let _ = write_row(&mut out, reading, layout);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::SensorSample;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn reading(event: &str, elapsed: Option<Duration>) -> Reading {
        Reading::new(
            Local.with_ymd_and_hms(2024, 6, 1, 14, 3, 9).unwrap(),
            SensorSample::from_fields([25.0, 40.0, 1013.25, 24.5, 25.1]),
            event,
            elapsed,
        )
    }

    #[test]
    fn test_columns() {
        assert_eq!(
            ColumnLayout::Standard.columns(),
            vec!["Time", "BME_T", "Hum", "Pres", "Th1", "Th2", "Event"]
        );
        assert_eq!(ColumnLayout::WithElapsed.columns()[1], "Elapsed");
    }

    #[test]
    fn test_standard_row() {
        let mut out = Vec::new();
        write_row(&mut out, &reading("HEATER_ON", None), ColumnLayout::Standard).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "14:03:09,25.0,40.0,1013.25,24.5,25.1,HEATER_ON\n"
        );
    }

    #[test]
    fn test_elapsed_row() {
        let mut out = Vec::new();
        let r = reading("", Some(Duration::from_secs(75)));
        write_row(&mut out, &r, ColumnLayout::WithElapsed).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "14:03:09,0:01:15,25.0,40.0,1013.25,24.5,25.1,\n"
        );

        let mut out = Vec::new();
        write_row(&mut out, &reading("", None), ColumnLayout::WithElapsed).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("14:03:09,,25.0"));
    }

    #[test]
    fn test_format_value_never_uses_exponents() {
        assert_eq!(format_value(25.0), "25.0");
        assert_eq!(format_value(1013.25), "1013.25");
        assert_eq!(format_value(-3.5), "-3.5");
        assert_eq!(format_value(1e16), "10000000000000000.0");
        assert_eq!(format_value(1e-7), "0.0000001");
        assert_eq!(format_value(2.5e-5), "0.000025");
    }

    #[test]
    fn test_event_escaping() {
        assert_eq!(escape_field("DOOR_OPEN"), "DOOR_OPEN");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_window_to_csv() {
        let readings = [reading("", None), reading("COOLER_ON", None)];
        let csv = window_to_csv(&readings, ColumnLayout::Standard);
        let text = String::from_utf8(csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Time,BME_T,Hum,Pres,Th1,Th2,Event");
        assert!(lines[2].ends_with(",COOLER_ON"));
    }
}
