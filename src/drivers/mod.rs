//! Peripheral drivers: moisture ADC, relay output lines, hardware watchdog.

pub mod adc;
pub mod relay;
pub mod watchdog;
