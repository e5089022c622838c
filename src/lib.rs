//! Greenhouse controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod safety;
pub mod sensors;

// Hardware-facing modules; each carries its own host simulation so the
// crate compiles and tests off-target.
pub mod adapters;
pub mod drivers;

/// Firmware version shown on the startup screen.
pub const FIRMWARE_VERSION: &str = "2.2";
