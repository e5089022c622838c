//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` bundles the single control-loop record ([`SystemData`]),
//! the configuration, and the tick's notion of "now".  State handlers read
//! from it; only the FSM engine and the sensor pipeline write to it.  There
//! is no global state: whoever owns the context owns the control loop.

use crate::config::SystemConfig;

use super::StateId;

/// Mid-scale ADC value assumed before the first accepted reading.
pub const DEFAULT_MOISTURE: u16 = 512;

// ---------------------------------------------------------------------------
// SystemData
// ---------------------------------------------------------------------------

/// The control-loop record.  Created once at boot, mutated every tick.
///
/// Timestamps are milliseconds since boot and wrap at 2^32; always compare
/// them with `wrapping_sub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemData {
    pub current_state: StateId,
    /// Diagnostics only.
    pub previous_state: StateId,

    pub last_read_ms: u32,
    pub state_start_ms: u32,
    /// Mirrors `state_start_ms`; kept for external diagnostics.
    pub last_state_change_ms: u32,
    pub last_display_ms: u32,

    /// Last **accepted** reading.  Never changes on a rejected read.
    pub current_moisture: u16,
    /// Value of `current_moisture` before the most recent read.
    pub previous_moisture: u16,

    /// The most recent read failed validation (single-cycle flag).
    pub sensor_error: bool,
    /// Rejected reads (spike or validation) since the last accepted one.
    pub consecutive_errors: u8,

    /// Watchdog resets since power-on, mirrored from the supervisor.
    pub wdt_reset_count: u8,
}

impl Default for SystemData {
    fn default() -> Self {
        Self {
            current_state: StateId::Idle,
            previous_state: StateId::Idle,
            last_read_ms: 0,
            state_start_ms: 0,
            last_state_change_ms: 0,
            last_display_ms: 0,
            current_moisture: DEFAULT_MOISTURE,
            previous_moisture: DEFAULT_MOISTURE,
            sensor_error: false,
            consecutive_errors: 0,
            wdt_reset_count: 0,
        }
    }
}

impl SystemData {
    /// Boot defaults with the state timer started at `now_ms`.
    pub fn new(now_ms: u32) -> Self {
        Self {
            state_start_ms: now_ms,
            last_state_change_ms: now_ms,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    pub data: SystemData,
    pub config: SystemConfig,
    /// Timestamp of the tick being evaluated.
    pub now_ms: u32,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            data: SystemData::default(),
            config,
            now_ms: 0,
        }
    }

    pub fn state(&self) -> StateId {
        self.data.current_state
    }

    /// Milliseconds since the current state was entered (wrap-safe).
    pub fn elapsed_in_state_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.data.state_start_ms)
    }

    pub fn moisture(&self) -> u16 {
        self.data.current_moisture
    }

    /// Sensor re-read interval for the current state.
    pub fn read_interval_ms(&self) -> u32 {
        if self.data.current_state == StateId::Idle {
            self.config.idle_read_interval_ms
        } else {
            self.config.read_interval_ms
        }
    }

    pub fn read_due(&self) -> bool {
        self.now_ms.wrapping_sub(self.data.last_read_ms) >= self.read_interval_ms()
    }

    pub fn display_due(&self) -> bool {
        self.now_ms.wrapping_sub(self.data.last_display_ms) >= self.config.display_interval_ms
    }

    pub fn error_limit_reached(&self) -> bool {
        self.data.consecutive_errors >= self.config.max_consecutive_errors
    }
}
