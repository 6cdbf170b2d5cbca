//! Live derived values and window statistics
//!
//! Everything here is recomputed from scratch on each call; windows are at
//! most a few hundred rows so there is no incremental bookkeeping.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::reading::{Channel, Reading};

/// Channels summarised on the dashboard
pub const SUMMARY_CHANNELS: [Channel; 3] =
    [Channel::Ambient, Channel::Thermistor1, Channel::Thermistor2];

/// Round to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// |Th1 - Th2| of a reading, rounded to 2 decimals
pub fn delta(reading: &Reading) -> f64 {
    round_to((reading.thermistor1() - reading.thermistor2()).abs(), 2)
}

/// Time elapsed since `test_start`, or `None` when no test is running
///
/// A start time in the future (clock adjustments) yields zero.
pub fn elapsed(test_start: Option<DateTime<Local>>, now: DateTime<Local>) -> Option<Duration> {
    test_start.map(|start| (now - start).to_std().unwrap_or(Duration::ZERO))
}

/// Format an elapsed time as `H:MM:SS` (`0:00:00` when no test is running)
pub fn format_elapsed(elapsed: Option<Duration>) -> String {
    let secs = elapsed.map(|d| d.as_secs()).unwrap_or(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Summary statistics for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Largest value
    pub max: f64,
    /// Smallest value
    pub min: f64,
    /// Population standard deviation, `None` for fewer than two samples
    pub std: Option<f64>,
    /// Number of samples
    pub count: usize,
}

impl ChannelStats {
    /// Compute statistics over `values`; `None` if there are none
    pub fn compute<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);

        let std = if count < 2 {
            None
        } else {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
            Some(variance.sqrt())
        };

        Some(Self {
            mean,
            max,
            min,
            std,
            count,
        })
    }
}

/// Statistics for one channel of the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Channel summarised
    pub channel: Channel,
    /// Statistics, `None` for an empty window
    pub stats: Option<ChannelStats>,
}

/// Statistics over the whole rolling window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// One entry per summary channel
    pub channels: Vec<ChannelSummary>,
}

impl WindowSummary {
    /// Summarise the default dashboard channels
    pub fn compute(readings: &[Reading]) -> Self {
        Self::compute_channels(readings, &SUMMARY_CHANNELS)
    }

    /// Summarise an explicit set of channels
    pub fn compute_channels(readings: &[Reading], channels: &[Channel]) -> Self {
        let channels = channels
            .iter()
            .map(|&channel| ChannelSummary {
                channel,
                stats: ChannelStats::compute(readings.iter().map(|r| r.get(channel))),
            })
            .collect();
        Self { channels }
    }

    /// Statistics for a channel, if it was summarised and the window is non-empty
    pub fn get(&self, channel: Channel) -> Option<&ChannelStats> {
        self.channels
            .iter()
            .find(|s| s.channel == channel)
            .and_then(|s| s.stats.as_ref())
    }
}
