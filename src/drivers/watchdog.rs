//! Task Watchdog Timer (TWDT) driver.
//!
//! Implements [`WatchdogPort`] over the ESP-IDF TWDT API and the
//! `esp_reset_reason()` register.  The watchdog-reset tally lives in RTC
//! memory that is not initialised on boot, so it survives a watchdog or
//! software reset and is only lost on power-on.
//!
//! On the host the same surface is simulated in memory; boots report
//! power-on unless a test injects other flags.

use crate::app::ports::WatchdogPort;
use crate::safety::ResetFlags;

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc_noinit")]
static RTC_WDT_TALLY: AtomicU8 = AtomicU8::new(0);

pub struct EspWatchdog {
    subscribed: bool,
    flags_taken: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_flags: ResetFlags,
    #[cfg(not(target_os = "espidf"))]
    sim_tally: u8,
    #[cfg(not(target_os = "espidf"))]
    sim_feeds: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_timeout_ms: Option<u32>,
}

impl Default for EspWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl EspWatchdog {
    pub fn new() -> Self {
        Self {
            subscribed: false,
            flags_taken: false,
            #[cfg(not(target_os = "espidf"))]
            sim_flags: ResetFlags(ResetFlags::POWER_ON),
            #[cfg(not(target_os = "espidf"))]
            sim_tally: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_feeds: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_timeout_ms: None,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

// ── Simulation hooks ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl EspWatchdog {
    /// Pretend the previous boot ended with `flags` and a retained `tally`.
    pub fn sim_with_reset(flags: ResetFlags, tally: u8) -> Self {
        Self {
            sim_flags: flags,
            sim_tally: tally,
            ..Self::new()
        }
    }

    /// Pretend the previous image left the TWDT running with `timeout_ms`.
    pub fn sim_left_armed(timeout_ms: u32) -> Self {
        Self {
            sim_timeout_ms: Some(timeout_ms),
            ..Self::new()
        }
    }

    pub fn sim_feeds(&self) -> u32 {
        self.sim_feeds
    }

    pub fn sim_timeout_ms(&self) -> Option<u32> {
        self.sim_timeout_ms
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WatchdogPort for EspWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                // Not initialised by the bootloader config; bring it up.
                let ret = esp_task_wdt_init(&cfg);
                if ret != ESP_OK {
                    warn!("WDT | init returned {ret}");
                }
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            self.subscribed = ret == ESP_OK;
            if self.subscribed {
                info!("WDT | subscribed ({timeout_ms} ms, panic on trigger)");
            } else {
                warn!("WDT | failed to subscribe ({ret})");
            }
        }
    }

    fn disarm(&mut self) {
        // A subscription can outlive a soft or watchdog reset of the previous
        // image, so delete even when this instance never added the task.
        let ret = unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
        match ret {
            ESP_OK => info!("WDT | unsubscribed"),
            ESP_ERR_NOT_FOUND | ESP_ERR_INVALID_STATE => {}
            _ => warn!("WDT | delete returned {ret}"),
        }
        self.subscribed = false;
    }

    fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    fn take_reset_flags(&mut self) -> ResetFlags {
        if self.flags_taken {
            return ResetFlags(0);
        }
        self.flags_taken = true;

        #[allow(non_upper_case_globals)]
        let bits = match unsafe { esp_reset_reason() } {
            esp_reset_reason_t_ESP_RST_POWERON => ResetFlags::POWER_ON,
            esp_reset_reason_t_ESP_RST_EXT => ResetFlags::EXTERNAL,
            esp_reset_reason_t_ESP_RST_BROWNOUT => ResetFlags::BROWN_OUT,
            esp_reset_reason_t_ESP_RST_INT_WDT
            | esp_reset_reason_t_ESP_RST_TASK_WDT
            | esp_reset_reason_t_ESP_RST_WDT => ResetFlags::WATCHDOG,
            _ => 0,
        };
        ResetFlags(bits)
    }

    fn load_reset_tally(&self) -> u8 {
        RTC_WDT_TALLY.load(Ordering::Relaxed)
    }

    fn store_reset_tally(&mut self, tally: u8) {
        RTC_WDT_TALLY.store(tally, Ordering::Relaxed);
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WatchdogPort for EspWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        self.subscribed = true;
        self.sim_timeout_ms = Some(timeout_ms);
    }

    fn disarm(&mut self) {
        self.subscribed = false;
        self.sim_timeout_ms = None;
    }

    fn feed(&mut self) {
        self.sim_feeds = self.sim_feeds.wrapping_add(1);
    }

    fn take_reset_flags(&mut self) -> ResetFlags {
        if self.flags_taken {
            return ResetFlags(0);
        }
        self.flags_taken = true;
        core::mem::take(&mut self.sim_flags)
    }

    fn load_reset_tally(&self) -> u8 {
        self.sim_tally
    }

    fn store_reset_tally(&mut self, tally: u8) {
        self.sim_tally = tally;
    }
}
