//! Soil-moisture acquisition and validation pipeline.
//!
//! Each read acquires a burst of raw samples, takes the median, and then
//! runs it through three gates before it may replace the last accepted
//! value:
//!
//! ```text
//!  samples ──▶ median ──▶ range check ──▶ edge warning ──▶ spike check ──▶ accept
//!                              │                               │
//!                         sensor_error                 consecutive_errors++
//!                      consecutive_errors++
//! ```
//!
//! Rejections never fail the control loop.  They are recorded in
//! [`SystemData`] (flag + counter) and the previous value is kept; the
//! state machine decides what a run of rejections means.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::fsm::context::SystemData;
use crate::safety::Keepalive;

/// Lowest valid 10-bit reading.
pub const ADC_MIN: i32 = 0;
/// Highest valid 10-bit reading.
pub const ADC_MAX: i32 = 1023;
/// Capacity of the sample buffer.
pub const MAX_SAMPLES: usize = 32;

/// The watchdog is fed before every sample whose index is a multiple of this.
const KEEPALIVE_EVERY: usize = 3;

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Median of `samples`: the element at index `len / 2` after sorting.
///
/// For even lengths this is the upper-middle element, not the mean of the
/// two middle values.  Returns `ADC_MIN - 1` (an invalid reading) for an
/// empty slice so the range check rejects it.
pub fn median(samples: &mut [i32]) -> i32 {
    if samples.is_empty() {
        return ADC_MIN - 1;
    }
    samples.sort_unstable();
    samples[samples.len() / 2]
}

/// Integer linear re-mapping with truncating division.
pub fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Raw reading → wetness percentage (0 = bone dry, 100 = saturated).
pub fn moisture_percent(raw: u16) -> u8 {
    let pct = map_range(i32::from(raw), ADC_MAX, ADC_MIN, 0, 100).clamp(0, 100);
    // Clamped to 0..=100 above.
    pct as u8
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Coarse soil condition relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoistureLevel {
    Dry,
    Wet,
    Normal,
}

impl MoistureLevel {
    pub fn classify(raw: u16, config: &SystemConfig) -> Self {
        if raw >= config.moisture_dry_threshold {
            Self::Dry
        } else if raw <= config.moisture_wet_threshold {
            Self::Wet
        } else {
            Self::Normal
        }
    }

    /// Three-column word for the display.
    pub const fn short(self) -> &'static str {
        match self {
            Self::Dry => "DRY",
            Self::Wet => "WET",
            Self::Normal => "OK ",
        }
    }

    /// Status text for the serial report.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Dry => "DRY (Soil is dry)",
            Self::Wet => "TOO WET (Too much moisture)",
            Self::Normal => "NORMAL (OK)",
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Outcome of one [`MoisturePipeline::read_moisture`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// The accepted value, or the previous one when rejected.
    pub value: u16,
    /// Why the fresh median was rejected, if it was.
    pub error: Option<SensorError>,
}

impl Reading {
    /// Hard validation failure (spikes don't count).
    pub fn is_error(&self) -> bool {
        self.error.is_some_and(SensorError::is_hard)
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}

/// Sensor constants captured from [`SystemConfig`] at construction.
#[derive(Debug, Clone, Copy)]
pub struct MoisturePipeline {
    samples: usize,
    sample_delay_ms: u32,
    edge_low: u16,
    edge_high: u16,
    max_deviation: u16,
}

impl MoisturePipeline {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            samples: usize::from(config.samples).clamp(1, MAX_SAMPLES),
            sample_delay_ms: config.sample_delay_ms,
            edge_low: config.edge_low,
            edge_high: config.edge_high,
            max_deviation: config.max_deviation,
        }
    }

    /// Take one filtered, validated reading and fold it into `data`.
    ///
    /// `data.current_moisture` only changes on acceptance.  `sensor_error`
    /// is set by range failures, left clear by spikes, and cleared on
    /// acceptance.  `consecutive_errors` counts both kinds of rejection
    /// (saturating) and resets on acceptance.
    pub fn read_moisture<S, D, K>(
        &self,
        probe: &mut S,
        delay: &mut D,
        keepalive: &mut K,
        data: &mut SystemData,
    ) -> Reading
    where
        S: SensorPort + ?Sized,
        D: DelayNs + ?Sized,
        K: Keepalive + ?Sized,
    {
        let mut buf = self.acquire(probe, delay, keepalive);
        let raw = median(&mut buf);

        // ── Range ────────────────────────────────────────────────
        let Some(value) = in_range(raw) else {
            data.sensor_error = true;
            data.consecutive_errors = data.consecutive_errors.saturating_add(1);
            warn!(
                "SENSOR | reading {raw} out of range, keeping {} ({} consecutive)",
                data.current_moisture, data.consecutive_errors
            );
            return Reading {
                value: data.current_moisture,
                error: Some(SensorError::OutOfRange(raw)),
            };
        };

        if value <= self.edge_low {
            warn!("SENSOR | reading {value} near 0, possible short circuit");
        } else if value >= self.edge_high {
            warn!("SENSOR | reading {value} near max, possible open circuit");
        }

        // ── Spike ────────────────────────────────────────────────
        let previous = data.current_moisture;
        if value.abs_diff(previous) > self.max_deviation {
            data.sensor_error = false;
            data.consecutive_errors = data.consecutive_errors.saturating_add(1);
            warn!(
                "SENSOR | spike rejected: {previous} -> {value} ({} consecutive)",
                data.consecutive_errors
            );
            return Reading {
                value: previous,
                error: Some(SensorError::Spike {
                    reading: value,
                    previous,
                }),
            };
        }

        data.sensor_error = false;
        data.consecutive_errors = 0;
        data.current_moisture = value;
        debug!("SENSOR | accepted {value}");
        Reading { value, error: None }
    }

    fn acquire<S, D, K>(
        &self,
        probe: &mut S,
        delay: &mut D,
        keepalive: &mut K,
    ) -> Vec<i32, MAX_SAMPLES>
    where
        S: SensorPort + ?Sized,
        D: DelayNs + ?Sized,
        K: Keepalive + ?Sized,
    {
        let mut buf = Vec::new();
        for i in 0..self.samples {
            if i % KEEPALIVE_EVERY == 0 {
                keepalive.keepalive();
            }
            // `samples` is clamped to the buffer capacity.
            let _ = buf.push(probe.sample());
            delay.delay_ms(self.sample_delay_ms);
        }
        buf
    }
}

fn in_range(raw: i32) -> Option<u16> {
    if (ADC_MIN..=ADC_MAX).contains(&raw) {
        u16::try_from(raw).ok()
    } else {
        None
    }
}
