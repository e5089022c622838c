//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).  The
//! status report doubles as the serial console UI; at debug level every
//! snapshot is also dumped as one JSON line for host-side tooling.

use log::{debug, error, info, warn};

use crate::app::events::{AppEvent, StatusSnapshot};
use crate::app::ports::EventSink;
use crate::sensors::moisture::moisture_percent;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn log_status(s: &StatusSnapshot) {
    info!(
        "STATUS | Moisture: {} ({}%) | Status: {}",
        s.moisture,
        s.moisture_percent,
        s.level.describe()
    );
    info!(
        "STATUS | State: {} ({}s) | Pump: {} | Fan: {}",
        s.state,
        s.elapsed_secs(),
        on_off(s.pump_on),
        on_off(s.fan_on)
    );
    if s.sensor_error {
        warn!("STATUS | sensor error: check connection");
    }
    if s.consecutive_errors > 0 {
        warn!("STATUS | consecutive errors: {}", s.consecutive_errors);
    }
    match serde_json::to_string(s) {
        Ok(json) => debug!("TELEM | {json}"),
        Err(e) => debug!("TELEM | encode failed: {e}"),
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Boot { reason, wdt_resets } => {
                info!("BOOT | reset cause: {reason} | watchdog resets: {wdt_resets}");
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={state}");
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            AppEvent::Status(s) => log_status(s),
            AppEvent::SensorFault {
                median,
                consecutive,
            } => {
                warn!("SENSOR | invalid reading {median} ({consecutive} consecutive)");
            }
            AppEvent::SpikeRejected {
                reading,
                previous,
                consecutive,
            } => {
                warn!(
                    "EMI | spike {previous} ({}%) -> {reading} ({}%) ignored ({consecutive} consecutive)",
                    moisture_percent(*previous),
                    moisture_percent(*reading)
                );
            }
            AppEvent::ErrorForced { consecutive } => {
                error!("SAFETY | {consecutive} consecutive sensor errors, forcing ERROR");
            }
            AppEvent::Recovered => {
                info!("SAFETY | sensor recovered");
            }
        }
    }
}
