//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them — log to serial, record in a test, etc.

use serde::Serialize;

use crate::fsm::StateId;
use crate::safety::ResetReason;
use crate::sensors::moisture::MoistureLevel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot-time reset diagnosis.
    Boot { reason: ResetReason, wdt_resets: u8 },

    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// Status report after every sensor read.
    Status(StatusSnapshot),

    /// The median failed range validation; the previous value was kept.
    SensorFault { median: i32, consecutive: u8 },

    /// The median jumped too far from the last accepted value.
    SpikeRejected {
        reading: u16,
        previous: u16,
        consecutive: u8,
    },

    /// Too many consecutive rejected readings; all relays forced OFF.
    ErrorForced { consecutive: u8 },

    /// A clean reading cleared the fault; leaving Error.
    Recovered,
}

/// Point-in-time view of the control loop for logs and displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: StateId,
    /// Last accepted raw reading.
    pub moisture: u16,
    pub moisture_percent: u8,
    pub level: MoistureLevel,
    pub elapsed_in_state_ms: u32,
    pub sensor_error: bool,
    pub consecutive_errors: u8,
    pub pump_on: bool,
    pub fan_on: bool,
}

impl StatusSnapshot {
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_in_state_ms / 1000
    }
}
