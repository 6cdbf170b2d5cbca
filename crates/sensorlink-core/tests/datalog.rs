use chrono::Local;
use pretty_assertions::assert_eq;
use sensorlink_core::datalog::{ColumnLayout, CsvLog, RollingWindow};
use sensorlink_core::reading::{Reading, SensorSample};
use std::fs;

fn reading(n: f64, event: &str) -> Reading {
    Reading::new(
        Local::now(),
        SensorSample::from_fields([n, 40.0, 1013.0, 24.5, 25.1]),
        event,
        None,
    )
}

#[test]
fn test_window_keeps_last_readings_in_order() {
    for capacity in [1usize, 3, 100, 300] {
        let counts = [
            1,
            capacity.saturating_sub(1).max(1),
            capacity,
            capacity + 1,
            capacity * 3,
        ];
        for count in counts {
            let mut window = RollingWindow::new(capacity);
            for i in 0..count {
                window.append(reading(i as f64, ""));
            }

            let kept = count.min(capacity);
            assert_eq!(window.len(), kept, "capacity {} count {}", capacity, count);

            let values: Vec<f64> = window.snapshot().iter().map(|r| r.ambient()).collect();
            let expected: Vec<f64> = ((count - kept)..count).map(|i| i as f64).collect();
            assert_eq!(values, expected);
        }
    }
}

#[test]
fn test_snapshot_does_not_mutate() {
    let mut window = RollingWindow::new(5);
    for i in 0..7 {
        window.append(reading(i as f64, "HEATER_ON"));
    }
    let first = window.snapshot();
    let second = window.snapshot();
    assert_eq!(first, second);
    assert_eq!(window.len(), 5);
}

#[test]
fn test_log_survives_unavailable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.csv");
    let parked = dir.path().join("parked.csv");
    let mut log = CsvLog::new(&path, ColumnLayout::Standard);

    assert!(log.append(&reading(1.0, "")));

    // Another program takes the file away for a moment
    fs::rename(&path, &parked).unwrap();
    fs::create_dir(&path).unwrap();
    assert!(!log.append(&reading(2.0, "")));
    assert_eq!(log.dropped_rows(), 1);

    fs::remove_dir(&path).unwrap();
    fs::rename(&parked, &path).unwrap();
    assert!(log.append(&reading(3.0, "DOOR_OPEN")));

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Time,BME_T,Hum,Pres,Th1,Th2,Event");
    assert!(lines[1].contains(",1.0,40.0,"));
    assert!(lines[2].contains(",3.0,40.0,"));
    assert!(lines[2].ends_with(",DOOR_OPEN"));

    assert_eq!(log.rows_written(), 2);
    assert_eq!(log.close(), (2, 1));
}

#[test]
fn test_export_matches_log_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = CsvLog::new(dir.path().join("t.csv"), ColumnLayout::WithElapsed);
    log.append(&reading(1.0, ""));

    let exported = log.read_all().unwrap();
    let text = String::from_utf8(exported).unwrap();
    assert!(text.starts_with("Time,Elapsed,BME_T,Hum,Pres,Th1,Th2,Event\n"));
}
