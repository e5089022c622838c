//! Safety supervisor.
//!
//! Owns the hardware watchdog and the boot reset-cause diagnosis.
//!
//! ## Watchdog lifecycle
//!
//! 1. `disable_watchdog()` first thing at boot, so a watchdog left running
//!    by the previous (crashed) image cannot fire during setup.
//! 2. `classify_last_reset()` reads and clears the reset-cause flags, and
//!    maintains the retained watchdog-reset tally.
//! 3. `arm_watchdog()` once setup is complete.
//! 4. `keepalive()` from the control loop, from the sensor pipeline during
//!    acquisition, and from `bounded_wait()` during long pauses.
//!
//! If the loop hangs, the watchdog restarts the MCU; the next boot sees
//! `ResetReason::Watchdog` and the tally grows.  A tally that keeps
//! growing points at a persistent interference source rather than a
//! one-off glitch, so it escalates to `error!`.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::WatchdogPort;
use crate::config::SystemConfig;

/// Longest single pause inside [`SafetySupervisor::bounded_wait`].
pub const WAIT_SLICE_MS: u32 = 10;

// ---------------------------------------------------------------------------
// Reset cause
// ---------------------------------------------------------------------------

/// Raw reset-cause bits as latched by the reset controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetFlags(pub u8);

impl ResetFlags {
    pub const POWER_ON: u8 = 1 << 0;
    pub const EXTERNAL: u8 = 1 << 1;
    pub const BROWN_OUT: u8 = 1 << 2;
    pub const WATCHDOG: u8 = 1 << 3;

    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Why the MCU last restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetReason {
    PowerOn,
    External,
    BrownOut,
    Watchdog,
    Unknown,
}

impl ResetReason {
    /// Several bits may be latched at once; the most severe cause wins.
    pub const fn from_flags(flags: ResetFlags) -> Self {
        if flags.contains(ResetFlags::WATCHDOG) {
            Self::Watchdog
        } else if flags.contains(ResetFlags::BROWN_OUT) {
            Self::BrownOut
        } else if flags.contains(ResetFlags::EXTERNAL) {
            Self::External
        } else if flags.contains(ResetFlags::POWER_ON) {
            Self::PowerOn
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PowerOn => "power-on",
            Self::External => "external reset",
            Self::BrownOut => "brown-out",
            Self::Watchdog => "watchdog reset",
            Self::Unknown => "unknown",
        })
    }
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Anything that can restart the watchdog countdown.
///
/// Lets long-running code (sample acquisition) feed the watchdog without
/// owning the supervisor.
pub trait Keepalive {
    fn keepalive(&mut self);
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

pub struct SafetySupervisor<W: WatchdogPort> {
    wdt: W,
    armed: bool,
    escalation_count: u8,
    /// Cached result of the first `classify_last_reset()` call.
    last_reset: Option<ResetReason>,
}

impl<W: WatchdogPort> SafetySupervisor<W> {
    pub fn new(wdt: W, config: &SystemConfig) -> Self {
        Self {
            wdt,
            armed: false,
            escalation_count: config.wdt_escalation_count,
            last_reset: None,
        }
    }

    /// Feed once (in case a previous image left it running), then disarm.
    pub fn disable_watchdog(&mut self) {
        self.wdt.feed();
        self.wdt.disarm();
        self.armed = false;
    }

    pub fn arm_watchdog(&mut self, timeout_ms: u32) {
        self.wdt.arm(timeout_ms);
        self.armed = true;
        info!("WDT | armed ({timeout_ms} ms)");
    }

    pub fn keepalive(&mut self) {
        self.wdt.feed();
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Diagnose the last reset.  The flags are consumed on the first call;
    /// later calls return the cached answer and leave the tally alone.
    pub fn classify_last_reset(&mut self) -> ResetReason {
        if let Some(reason) = self.last_reset {
            return reason;
        }

        let flags = self.wdt.take_reset_flags();
        let reason = ResetReason::from_flags(flags);
        self.last_reset = Some(reason);

        match reason {
            ResetReason::PowerOn => {
                self.wdt.store_reset_tally(0);
                info!("WDT | boot: power-on");
            }
            ResetReason::Watchdog => {
                let tally = self.wdt.load_reset_tally().saturating_add(1);
                self.wdt.store_reset_tally(tally);
                warn!("WDT | boot: watchdog reset, possible EMI (#{tally})");
                if tally >= self.escalation_count {
                    error!("WDT | multiple watchdog resets ({tally}), check for a persistent EMI source");
                }
            }
            other => info!("WDT | boot: {other}"),
        }

        reason
    }

    pub fn wdt_reset_count(&self) -> u8 {
        self.wdt.load_reset_tally()
    }

    pub fn clear_wdt_reset_count(&mut self) {
        self.wdt.store_reset_tally(0);
    }

    /// Wait `ms` in slices of at most [`WAIT_SLICE_MS`], feeding the
    /// watchdog before each slice and once more at the end.
    pub fn bounded_wait<D: DelayNs + ?Sized>(&mut self, ms: u32, delay: &mut D) {
        let mut remaining = ms;
        while remaining > 0 {
            let slice = remaining.min(WAIT_SLICE_MS);
            self.wdt.feed();
            delay.delay_ms(slice);
            remaining -= slice;
        }
        self.wdt.feed();
    }

    pub fn watchdog(&self) -> &W {
        &self.wdt
    }
}

impl<W: WatchdogPort> Keepalive for SafetySupervisor<W> {
    fn keepalive(&mut self) {
        self.wdt.feed();
    }
}
