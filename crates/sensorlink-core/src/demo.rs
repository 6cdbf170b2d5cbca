//! Demo Mode - Simulated sensor board for testing
//!
//! Generates plausible board output without hardware attached. Ambient
//! conditions drift slowly; the two thermistors follow a heater that switches
//! on and off every few minutes, with thermistor 1 mounted closer to it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::reading::SensorSample;

/// Demo sensor board
pub struct DemoSensor {
    /// Current heater phase
    heater: HeaterPhase,
    /// Thermistor 1 temperature (°C, smoothed)
    th1: f64,
    /// Thermistor 2 temperature (°C, smoothed)
    th2: f64,
    /// Last update time (ms)
    last_update_ms: Option<u64>,
    /// Random number generator
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HeaterPhase {
    /// Heater off until the given time
    Off { until_ms: u64 },
    /// Heater on until the given time
    On { until_ms: u64 },
}

/// Base room temperature in °C
const ROOM_TEMP: f64 = 22.0;
/// Temperature the heater drives thermistor 1 towards
const HEATED_TEMP: f64 = 38.0;

impl Default for DemoSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoSensor {
    /// Create a demo sensor seeded from entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a demo sensor with a fixed seed (reproducible output)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let first_switch = rng.gen_range(20_000..40_000);
        Self {
            heater: HeaterPhase::Off {
                until_ms: first_switch,
            },
            th1: ROOM_TEMP,
            th2: ROOM_TEMP,
            last_update_ms: None,
            rng,
        }
    }

    /// Whether the simulated heater is currently on
    pub fn heater_on(&self) -> bool {
        matches!(self.heater, HeaterPhase::On { .. })
    }

    /// Advance the simulation to `elapsed_ms` and produce a sample
    pub fn update(&mut self, elapsed_ms: u64) -> SensorSample {
        let delta_ms = self
            .last_update_ms
            .map(|last| elapsed_ms.saturating_sub(last))
            .unwrap_or(0);
        self.last_update_ms = Some(elapsed_ms);

        self.update_heater(elapsed_ms);

        let t = elapsed_ms as f64 / 1000.0;
        let dt = delta_ms as f64 / 1000.0;

        // First-order response towards the heater target
        let target = if self.heater_on() { HEATED_TEMP } else { ROOM_TEMP };
        self.th1 += (target - self.th1) * (1.0 - (-dt / 30.0).exp());
        self.th2 += (self.th1 - self.th2) * (1.0 - (-dt / 90.0).exp());

        let ambient = ROOM_TEMP + 0.5 * (t / 600.0).sin() + self.noise(0.05);
        let humidity = 45.0 + 3.0 * (t / 300.0).sin() + self.noise(0.2);
        let pressure = 1013.0 + 0.8 * (t / 900.0).sin() + self.noise(0.05);
        let th1 = self.th1 + self.noise(0.03);
        let th2 = self.th2 + self.noise(0.03);

        SensorSample::from_fields([ambient, humidity, pressure, th1, th2])
    }

    /// Produce the next datagram payload in the board's wire format
    pub fn next_payload(&mut self, elapsed_ms: u64) -> String {
        format_payload(&self.update(elapsed_ms))
    }

    fn update_heater(&mut self, now_ms: u64) {
        match self.heater {
            HeaterPhase::Off { until_ms } if now_ms >= until_ms => {
                let on_for = self.rng.gen_range(60_000..120_000);
                self.heater = HeaterPhase::On {
                    until_ms: now_ms + on_for,
                };
            }
            HeaterPhase::On { until_ms } if now_ms >= until_ms => {
                let off_for = self.rng.gen_range(90_000..180_000);
                self.heater = HeaterPhase::Off {
                    until_ms: now_ms + off_for,
                };
            }
            _ => {}
        }
    }

    fn noise(&mut self, amplitude: f64) -> f64 {
        self.rng.gen_range(-amplitude..=amplitude)
    }
}

/// Format a sample the way the board firmware does (2 decimals)
pub fn format_payload(sample: &SensorSample) -> String {
    format!(
        "{:.2},{:.2},{:.2},{:.2},{:.2}",
        sample.ambient, sample.humidity, sample.pressure, sample.thermistor1, sample.thermistor2
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::parse_payload;

    #[test]
    fn test_payload_decodes() {
        let mut sensor = DemoSensor::with_seed(7);
        for ms in (0..10_000).step_by(500) {
            let payload = sensor.next_payload(ms);
            assert!(parse_payload(payload.as_bytes()).is_ok(), "bad payload {}", payload);
        }
    }

    #[test]
    fn test_values_in_plausible_ranges() {
        let mut sensor = DemoSensor::with_seed(42);
        for ms in (0..600_000).step_by(1000) {
            let s = sensor.update(ms);
            assert!(s.ambient > 20.0 && s.ambient < 24.0, "ambient {}", s.ambient);
            assert!(s.humidity > 40.0 && s.humidity < 50.0, "humidity {}", s.humidity);
            assert!(s.pressure > 1011.0 && s.pressure < 1015.0, "pressure {}", s.pressure);
            assert!(s.thermistor1 > 21.0 && s.thermistor1 < 39.0, "th1 {}", s.thermistor1);
        }
    }

    #[test]
    fn test_heater_warms_thermistor() {
        let mut sensor = DemoSensor::with_seed(1);
        let start = sensor.update(0).thermistor1;

        // Step until the heater has been on for a while
        let mut ms = 0;
        while !sensor.heater_on() {
            ms += 1000;
            sensor.update(ms);
        }
        for _ in 0..60 {
            ms += 1000;
            sensor.update(ms);
        }
        let warmed = sensor.update(ms + 1000).thermistor1;
        assert!(warmed > start + 5.0, "{} vs {}", warmed, start);
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let mut a = DemoSensor::with_seed(9);
        let mut b = DemoSensor::with_seed(9);
        assert_eq!(a.next_payload(1000), b.next_payload(1000));
    }
}
