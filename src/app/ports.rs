//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (moisture probe, relay board, watchdog, log and display
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every port can be replaced by a recording fake in tests.

use core::fmt;

use serde::Serialize;

use crate::display::LcdFrame;
use crate::safety::ResetFlags;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Devices behind the relay module
// ───────────────────────────────────────────────────────────────

/// Every relay-driven load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Device {
    Pump = 0,
    Fan = 1,
    /// Reserved channel IN1.
    Aux1 = 2,
    /// Reserved channel IN2.
    Aux2 = 3,
}

impl Device {
    pub const COUNT: usize = 4;
    pub const ALL: [Device; Device::COUNT] = [Self::Pump, Self::Fan, Self::Aux1, Self::Aux2];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pump => "pump",
            Self::Fan => "fan",
            Self::Aux1 => "relay1",
            Self::Aux2 => "relay2",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one raw analog sample per call.
///
/// Samples are `i32` so adapters can report conversion failures as
/// out-of-domain values; the pipeline's range check rejects them.
pub trait SensorPort {
    fn sample(&mut self) -> i32;
}

/// Any `FnMut() -> i32` is a probe (ADC closures on target, scripted
/// sequences in tests).
impl<F> SensorPort for F
where
    F: FnMut() -> i32,
{
    fn sample(&mut self) -> i32 {
        self()
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: idempotent on/off control of every relay.
///
/// "On" always means the load is physically energised; polarity is the
/// adapter's concern.
pub trait ActuatorPort {
    /// Energise `device`.  Re-issues the line write even when already running.
    fn start(&mut self, device: Device);

    /// De-energise `device`.  Always forces the line to OFF.
    fn stop(&mut self, device: Device);

    /// Whether `device` is believed to be energised.
    fn is_running(&self, device: Device) -> bool;

    /// Stop pump and fan (ordinary transitions).
    fn stop_all(&mut self);

    /// Force every relay OFF and reset all tracking, regardless of state.
    fn emergency_shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, test recorder).  Best-effort: nothing
/// flows back.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → 16x2 character display)
// ───────────────────────────────────────────────────────────────

/// Receives fully laid-out frames.  Rendering failures stay inside the adapter.
pub trait DisplayPort {
    fn show(&mut self, frame: &LcdFrame);
}

// ───────────────────────────────────────────────────────────────
// Watchdog port (driven adapter: supervisor ↔ hardware timer)
// ───────────────────────────────────────────────────────────────

/// Minimal platform surface for the hardware watchdog and the reset-cause
/// register.
pub trait WatchdogPort {
    /// Enable the watchdog with the given timeout.
    fn arm(&mut self, timeout_ms: u32);

    /// Disable the watchdog (boot path only).
    fn disarm(&mut self);

    /// Restart the watchdog countdown.
    fn feed(&mut self);

    /// Read **and clear** the boot reset-cause flags.
    fn take_reset_flags(&mut self) -> ResetFlags;

    /// Watchdog-reset tally kept in memory that survives a non-power-on reset.
    fn load_reset_tally(&self) -> u8;

    fn store_reset_tally(&mut self, tally: u8);
}
