//! Unified error types for the greenhouse firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path's error handling uniform.  All variants are `Copy` so they can
//! be passed through the sensor pipeline and relay board without allocation.
//!
//! Sensor trouble is never propagated as a `Result` out of the control loop:
//! the pipeline records a [`SensorError`] in its [`Reading`] and the state
//! machine reacts to the flag/counter state instead.
//!
//! [`Reading`]: crate::sensors::moisture::Reading

use core::fmt;

use crate::app::ports::Device;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A moisture reading was rejected.
    Sensor(SensorError),
    /// A relay line could not be driven.
    Actuator(ActuatorError),
    /// Configuration is inconsistent.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Median of the sample set fell outside the ADC domain.
    OutOfRange(i32),
    /// Median jumped further from the last accepted value than allowed
    /// (EMI spike).  Not a hard sensor error.
    Spike { reading: u16, previous: u16 },
}

impl SensorError {
    /// Hard validation failures set `sensor_error`; spikes only count.
    pub fn is_hard(self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(raw) => write!(f, "reading {raw} out of range"),
            Self::Spike { reading, previous } => {
                write!(f, "spike {previous} -> {reading}")
            }
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO write to the relay input failed.
    GpioWriteFailed(Device),
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed(device) => write!(f, "{device} GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
