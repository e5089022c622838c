//! Sensor subsystem.
//!
//! A single capacitive soil-moisture probe on an ADC channel.  The raw
//! sample source is abstracted behind [`SensorPort`](crate::app::ports::SensorPort);
//! everything here is pure logic that runs identically on host and target.

pub mod moisture;

pub use moisture::{MoistureLevel, MoisturePipeline, Reading};
