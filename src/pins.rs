//! GPIO / peripheral pin assignments for the greenhouse controller board.
//!
//! Single source of truth — `main` references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Soil moisture probe (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive / resistive soil probe, analog output.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const SOIL_MOISTURE_ADC_GPIO: i32 = 4;
pub const SOIL_MOISTURE_ADC_CHANNEL: u32 = 3;

/// The ESP32-S3 ADC is 12-bit; readings are scaled down by this shift to the
/// 10-bit domain the thresholds are calibrated in.
pub const ADC_TO_10BIT_SHIFT: u32 = 2;

// ---------------------------------------------------------------------------
// 4-channel relay module (IN1..IN4)
// ---------------------------------------------------------------------------

/// IN1 — reserved.
pub const RELAY_AUX1_GPIO: i32 = 5;
/// IN2 — reserved.
pub const RELAY_AUX2_GPIO: i32 = 6;
/// IN3 — water pump.
pub const RELAY_PUMP_GPIO: i32 = 7;
/// IN4 — ventilation fan.
pub const RELAY_FAN_GPIO: i32 = 15;
