//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM, the sensor pipeline, and the shared
//! context.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService        │
//! ActuatorPort ◀──│  Pipeline · FSM · Timers │ ──▶ DisplayPort
//!                 └──────────────────────────┘
//!                              │
//!                          Keepalive
//! ```
//!
//! One [`tick`](AppService::tick) is one pass of the control loop:
//!
//! 1. keepalive, then forced Error if the rejection limit is already reached
//! 2. sensor read, if the state-dependent interval has elapsed
//! 3. on a fresh read: forced Error when the rejection limit is reached,
//!    otherwise the moisture-driven transition check
//! 4. display refresh, if due
//! 5. the current state's timed action (run limits, cooldown, recovery)

use embedded_hal::delay::DelayNs;
use log::info;

use crate::config::SystemConfig;
use crate::display::{self, LcdFrame};
use crate::error::SensorError;
use crate::fsm::context::{FsmContext, SystemData};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId, Transition};
use crate::safety::Keepalive;
use crate::sensors::moisture::{MoistureLevel, MoisturePipeline, Reading, moisture_percent};

use super::commands::AppCommand;
use super::events::{AppEvent, StatusSnapshot};
use super::ports::{ActuatorPort, Device, DisplayPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
///
/// `H` is the combined hardware adapter: it satisfies **both**
/// [`SensorPort`] and [`ActuatorPort`], which avoids a double mutable
/// borrow while keeping the port boundary explicit.
pub struct AppService<H: SensorPort + ActuatorPort> {
    fsm: Fsm<H>,
    ctx: FsmContext,
    pipeline: MoisturePipeline,
}

impl<H: SensorPort + ActuatorPort> AppService<H> {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let pipeline = MoisturePipeline::from_config(&config);
        Self {
            fsm: Fsm::new(build_state_table()),
            ctx: FsmContext::new(config),
            pipeline,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in Idle with its state timer at `now_ms`.
    pub fn start(&mut self, now_ms: u32, wdt_resets: u8, hw: &mut H, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.ctx.data.wdt_reset_count = wdt_resets;
        self.fsm.start(&mut self.ctx, hw);
        sink.emit(&AppEvent::Started(self.ctx.state()));
        info!("AppService started in {}", self.ctx.state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.  See the module docs for the order.
    pub fn tick<D, K, E, V>(
        &mut self,
        now_ms: u32,
        hw: &mut H,
        delay: &mut D,
        wdt: &mut K,
        sink: &mut E,
        display: &mut V,
    ) where
        D: DelayNs + ?Sized,
        K: Keepalive + ?Sized,
        E: EventSink + ?Sized,
        V: DisplayPort + ?Sized,
    {
        self.ctx.now_ms = now_ms;
        wdt.keepalive();

        // Forced Error is checked first, read or not
        if self.ctx.error_limit_reached() && self.ctx.state() != StateId::Error {
            self.force_error(hw, sink, display);
        }

        // 1. Sensor read (state-dependent interval)
        if self.ctx.read_due() {
            self.ctx.data.last_read_ms = now_ms;
            wdt.keepalive();
            self.ctx.data.previous_moisture = self.ctx.data.current_moisture;
            let reading = self
                .pipeline
                .read_moisture(hw, delay, wdt, &mut self.ctx.data);
            self.report_reading(&reading, hw, sink);
            wdt.keepalive();

            // 2. Forced Error beats any moisture decision
            if self.ctx.error_limit_reached() {
                self.force_error(hw, sink, display);
            } else if !self.ctx.data.sensor_error && self.ctx.state() != StateId::Error {
                if let Some(t) = self.fsm.check_moisture(&mut self.ctx, hw) {
                    self.announce(t, hw, sink, display);
                }
            }
        }

        wdt.keepalive();

        // 3. Display refresh
        if self.ctx.display_due() {
            self.refresh_display(hw, display);
        }
        wdt.keepalive();

        // 4. Timed action
        if let Some(t) = self.fsm.run_timer(&mut self.ctx, hw) {
            if t.from == StateId::Error {
                sink.emit(&AppEvent::Recovered);
            }
            self.announce(t, hw, sink, display);
        }

        wdt.keepalive();
    }

    /// Move to `target` immediately.  Returns `false` when already there.
    pub fn transition_to<E, V>(
        &mut self,
        target: StateId,
        now_ms: u32,
        hw: &mut H,
        sink: &mut E,
        display: &mut V,
    ) -> bool
    where
        E: EventSink + ?Sized,
        V: DisplayPort + ?Sized,
    {
        self.ctx.now_ms = now_ms;
        match self.fsm.transition_to(target, &mut self.ctx, hw) {
            Some(t) => {
                self.announce(t, hw, sink, display);
                true
            }
            None => false,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external supervisory command.
    pub fn handle_command<E, V>(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut H,
        sink: &mut E,
        display: &mut V,
    ) where
        E: EventSink + ?Sized,
        V: DisplayPort + ?Sized,
    {
        match cmd {
            AppCommand::ResetSystemData => {
                let from = self.ctx.state();
                let wdt_resets = self.ctx.data.wdt_reset_count;
                hw.stop_all();
                self.ctx.now_ms = now_ms;
                self.ctx.data = SystemData {
                    wdt_reset_count: wdt_resets,
                    ..SystemData::new(now_ms)
                };
                info!("AppService: system data reset");
                if from != StateId::Idle {
                    sink.emit(&AppEvent::StateChanged {
                        from,
                        to: StateId::Idle,
                    });
                }
                self.refresh_display(hw, display);
            }
            AppCommand::ForceState(target) => {
                self.transition_to(target, now_ms, hw, sink, display);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.ctx.state()
    }

    pub fn data(&self) -> &SystemData {
        &self.ctx.data
    }

    pub fn snapshot(&self, hw: &H) -> StatusSnapshot {
        let moisture = self.ctx.moisture();
        StatusSnapshot {
            state: self.ctx.state(),
            moisture,
            moisture_percent: moisture_percent(moisture),
            level: MoistureLevel::classify(moisture, &self.ctx.config),
            elapsed_in_state_ms: self.ctx.elapsed_in_state_ms(),
            sensor_error: self.ctx.data.sensor_error,
            consecutive_errors: self.ctx.data.consecutive_errors,
            pump_on: hw.is_running(Device::Pump),
            fan_on: hw.is_running(Device::Fan),
        }
    }

    /// The screen for the current state: the error screen while in Error,
    /// the status screen otherwise.
    pub fn frame(&self, hw: &H) -> LcdFrame {
        if self.ctx.state() == StateId::Error {
            display::render_error()
        } else {
            display::render_status(&self.snapshot(hw))
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Shut everything down and enter Error.  Already in Error, only the
    /// shutdown is re-asserted.
    fn force_error<E, V>(&mut self, hw: &mut H, sink: &mut E, display: &mut V)
    where
        E: EventSink + ?Sized,
        V: DisplayPort + ?Sized,
    {
        let consecutive = self.ctx.data.consecutive_errors;
        if let Some(t) = self.fsm.force_error(&mut self.ctx, hw) {
            sink.emit(&AppEvent::ErrorForced { consecutive });
            self.announce(t, hw, sink, display);
        }
    }

    fn report_reading<E: EventSink + ?Sized>(&self, reading: &Reading, hw: &H, sink: &mut E) {
        let consecutive = self.ctx.data.consecutive_errors;
        match reading.error {
            Some(SensorError::OutOfRange(median)) => {
                sink.emit(&AppEvent::SensorFault {
                    median,
                    consecutive,
                });
            }
            Some(SensorError::Spike { reading, previous }) => {
                sink.emit(&AppEvent::SpikeRejected {
                    reading,
                    previous,
                    consecutive,
                });
            }
            None => {}
        }
        sink.emit(&AppEvent::Status(self.snapshot(hw)));
    }

    fn announce<E, V>(&mut self, t: Transition, hw: &H, sink: &mut E, display: &mut V)
    where
        E: EventSink + ?Sized,
        V: DisplayPort + ?Sized,
    {
        sink.emit(&AppEvent::StateChanged {
            from: t.from,
            to: t.to,
        });
        self.refresh_display(hw, display);
    }

    fn refresh_display<V: DisplayPort + ?Sized>(&mut self, hw: &H, display: &mut V) {
        self.ctx.data.last_display_ms = self.ctx.now_ms;
        display.show(&self.frame(hw));
    }
}
