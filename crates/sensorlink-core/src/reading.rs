//! Sensor readings
//!
//! A [`SensorSample`] is the five raw values carried by one datagram. Once the
//! session context (arrival time, event tag, test clock) is attached it becomes
//! an immutable [`Reading`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Number of numeric fields in one datagram
pub const FIELD_COUNT: usize = 5;

/// Numeric channels reported by the sensor board, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// BME280 ambient temperature
    Ambient,
    /// BME280 relative humidity
    Humidity,
    /// BME280 barometric pressure
    Pressure,
    /// First thermistor
    Thermistor1,
    /// Second thermistor
    Thermistor2,
}

impl Channel {
    /// All channels in wire order
    pub const ALL: [Channel; FIELD_COUNT] = [
        Channel::Ambient,
        Channel::Humidity,
        Channel::Pressure,
        Channel::Thermistor1,
        Channel::Thermistor2,
    ];

    /// Column name used in CSV logs
    pub fn column(&self) -> &'static str {
        match self {
            Channel::Ambient => "BME_T",
            Channel::Humidity => "Hum",
            Channel::Pressure => "Pres",
            Channel::Thermistor1 => "Th1",
            Channel::Thermistor2 => "Th2",
        }
    }

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Ambient | Channel::Thermistor1 | Channel::Thermistor2 => "°C",
            Channel::Humidity => "%",
            Channel::Pressure => "hPa",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Ambient => "BME280 Temp",
            Channel::Humidity => "Humidity",
            Channel::Pressure => "Pressure",
            Channel::Thermistor1 => "Thermistor 1",
            Channel::Thermistor2 => "Thermistor 2",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five values of one datagram, without session context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Ambient temperature in °C
    pub ambient: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Pressure in hPa
    pub pressure: f64,
    /// Thermistor 1 temperature in °C
    pub thermistor1: f64,
    /// Thermistor 2 temperature in °C
    pub thermistor2: f64,
}

impl SensorSample {
    /// Build a sample from values in wire order
    pub fn from_fields(values: [f64; FIELD_COUNT]) -> Self {
        let [ambient, humidity, pressure, thermistor1, thermistor2] = values;
        Self {
            ambient,
            humidity,
            pressure,
            thermistor1,
            thermistor2,
        }
    }

    /// Value of a single channel
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Ambient => self.ambient,
            Channel::Humidity => self.humidity,
            Channel::Pressure => self.pressure,
            Channel::Thermistor1 => self.thermistor1,
            Channel::Thermistor2 => self.thermistor2,
        }
    }
}

/// One decoded datagram with its session context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    timestamp: DateTime<Local>,
    sample: SensorSample,
    event: String,
    elapsed: Option<Duration>,
}

impl Reading {
    /// Create a new reading
    pub fn new(
        timestamp: DateTime<Local>,
        sample: SensorSample,
        event: impl Into<String>,
        elapsed: Option<Duration>,
    ) -> Self {
        Self {
            timestamp,
            sample,
            event: event.into(),
            elapsed,
        }
    }

    /// Wall-clock arrival time
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Raw sensor values
    pub fn sample(&self) -> &SensorSample {
        &self.sample
    }

    /// Value of a single channel
    pub fn get(&self, channel: Channel) -> f64 {
        self.sample.get(channel)
    }

    /// Ambient temperature in °C
    pub fn ambient(&self) -> f64 {
        self.sample.ambient
    }

    /// Relative humidity in %
    pub fn humidity(&self) -> f64 {
        self.sample.humidity
    }

    /// Pressure in hPa
    pub fn pressure(&self) -> f64 {
        self.sample.pressure
    }

    /// Thermistor 1 temperature in °C
    pub fn thermistor1(&self) -> f64 {
        self.sample.thermistor1
    }

    /// Thermistor 2 temperature in °C
    pub fn thermistor2(&self) -> f64 {
        self.sample.thermistor2
    }

    /// Event tag active when the reading arrived (empty if none)
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Time since the test was started, if one was running
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Thermistor difference |Th1 - Th2|, rounded to 2 decimals
    pub fn delta(&self) -> f64 {
        crate::stats::delta(self)
    }
}
