//! System configuration parameters
//!
//! All tunable parameters for the greenhouse controller.  Loaded once at
//! boot and never changed while the control loop runs.
//!
//! Moisture values are raw ADC counts in `0..=1023`; a **lower** count
//! means **wetter** soil for this sensor class.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::moisture::{ADC_MAX, MAX_SAMPLES};

/// Electrical convention of the relay module inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayPolarity {
    /// LOW energises the relay (common opto-isolated 4-channel boards).
    ActiveLow,
    /// HIGH energises the relay.
    ActiveHigh,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Moisture thresholds (raw ADC) ---
    /// At or above this reading the soil is dry and the pump starts.
    pub moisture_dry_threshold: u16,
    /// At or below this reading the soil is too wet and the fan starts.
    pub moisture_wet_threshold: u16,
    /// Dead-band applied when leaving Watering / Ventilating.
    pub hysteresis: u16,

    // --- Run limits (milliseconds) ---
    pub pump_run_time_ms: u32,
    pub fan_run_time_ms: u32,
    /// Mandatory dead-time after any active period.
    pub cooldown_time_ms: u32,

    // --- Polling (milliseconds) ---
    /// Sensor read interval while watering / ventilating / cooling down.
    pub read_interval_ms: u32,
    /// Sensor read interval while idle.
    pub idle_read_interval_ms: u32,
    /// Display refresh interval.
    pub display_interval_ms: u32,
    /// Pause between control loop iterations.
    pub loop_interval_ms: u32,
    /// How long the startup screen stays up before the watchdog is armed.
    pub startup_screen_ms: u32,

    // --- Sensor pipeline ---
    /// Samples per reading for the median filter.
    pub samples: u8,
    /// Delay between consecutive samples.
    pub sample_delay_ms: u32,
    /// Readings at or below this may indicate a short circuit.
    pub edge_low: u16,
    /// Readings at or above this may indicate an open circuit.
    pub edge_high: u16,
    /// Largest accepted jump between consecutive readings.
    pub max_deviation: u16,

    // --- Safety ---
    pub watchdog_timeout_ms: u32,
    /// Consecutive rejected readings before the forced Error transition.
    pub max_consecutive_errors: u8,
    /// Watchdog resets since power-on before the escalating warning.
    pub wdt_escalation_count: u8,

    // --- Relays ---
    pub relay_polarity: RelayPolarity,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            moisture_dry_threshold: 700,
            moisture_wet_threshold: 300,
            hysteresis: 50,

            // Run limits
            pump_run_time_ms: 5_000,
            fan_run_time_ms: 10_000,
            cooldown_time_ms: 30_000,

            // Polling
            read_interval_ms: 2_000,
            idle_read_interval_ms: 5_000,
            display_interval_ms: 500,
            loop_interval_ms: 10,
            startup_screen_ms: 2_000,

            // Sensor
            samples: 10,
            sample_delay_ms: 5,
            edge_low: 10,
            edge_high: 1013,
            max_deviation: 200,

            // Safety
            watchdog_timeout_ms: 2_000,
            max_consecutive_errors: 5,
            wdt_escalation_count: 3,

            relay_polarity: RelayPolarity::ActiveLow,
        }
    }
}

impl SystemConfig {
    /// Reject settings that would make the control loop oscillate, starve
    /// the watchdog, or overflow the sample buffer.
    pub fn validate(&self) -> Result<()> {
        let dry = self.moisture_dry_threshold;
        let wet = self.moisture_wet_threshold;

        if dry > ADC_MAX as u16 {
            return Err(Error::Config("dry threshold above ADC range"));
        }
        if wet >= dry {
            return Err(Error::Config("wet threshold must be below dry threshold"));
        }
        if self.hysteresis >= dry || u32::from(wet) + u32::from(self.hysteresis) >= u32::from(dry) {
            return Err(Error::Config("hysteresis band overlaps the opposite threshold"));
        }
        if self.samples == 0 || usize::from(self.samples) > MAX_SAMPLES {
            return Err(Error::Config("sample count out of range"));
        }
        if self.edge_low >= self.edge_high {
            return Err(Error::Config("edge warning band inverted"));
        }
        if self.max_deviation == 0 {
            return Err(Error::Config("max deviation must be non-zero"));
        }
        if self.pump_run_time_ms == 0 || self.fan_run_time_ms == 0 {
            return Err(Error::Config("run limits must be non-zero"));
        }
        if self.read_interval_ms == 0 || self.idle_read_interval_ms == 0 {
            return Err(Error::Config("read intervals must be non-zero"));
        }
        if self.watchdog_timeout_ms == 0 {
            return Err(Error::Config("watchdog timeout must be non-zero"));
        }
        // A full acquisition is fed every third sample; one gap must fit.
        if self.sample_delay_ms.saturating_mul(3) >= self.watchdog_timeout_ms {
            return Err(Error::Config("sample delay too long for watchdog timeout"));
        }
        if self.max_consecutive_errors == 0 {
            return Err(Error::Config("max consecutive errors must be non-zero"));
        }
        Ok(())
    }
}
