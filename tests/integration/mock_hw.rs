//! Mock hardware for integration tests.
//!
//! The relay lines and the probe are mocked at the lowest level
//! (`OutputPin`, `SensorPort`) so the real [`RelayBoard`] and
//! [`HardwareAdapter`] run unmodified on the host.  Sinks record every
//! event and frame so tests can assert on the full history.

use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use greenhouse::adapters::hardware::{HardwareAdapter, RelayBoard};
use greenhouse::app::events::AppEvent;
use greenhouse::app::ports::{Device, DisplayPort, EventSink, SensorPort};
use greenhouse::app::service::AppService;
use greenhouse::config::SystemConfig;
use greenhouse::display::LcdFrame;
use greenhouse::drivers::relay::RelayChannel;
use greenhouse::fsm::StateId;
use greenhouse::safety::Keepalive;

// ── Relay line ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub writes: u32,
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.writes += 1;
        Ok(())
    }
}

// ── Probe ─────────────────────────────────────────────────────

/// Returns scripted values first, then `value` forever.
#[derive(Debug, Default)]
pub struct MockProbe {
    pub value: i32,
    pub script: VecDeque<i32>,
    pub samples: u32,
}

impl SensorPort for MockProbe {
    fn sample(&mut self) -> i32 {
        self.samples += 1;
        self.script.pop_front().unwrap_or(self.value)
    }
}

// ── Timing ────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ms: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns) / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

#[derive(Debug, Default)]
pub struct CountingKeepalive {
    pub feeds: u32,
}

impl Keepalive for CountingKeepalive {
    fn keepalive(&mut self) {
        self.feeds += 1;
    }
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub frames: Vec<LcdFrame>,
}

impl DisplayPort for RecordingDisplay {
    fn show(&mut self, frame: &LcdFrame) {
        self.frames.push(frame.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type MockHw = HardwareAdapter<MockProbe, MockPin>;

/// A started [`AppService`] wired to mocks, with a manual clock.
pub struct Harness {
    pub app: AppService<MockHw>,
    pub hw: MockHw,
    pub delay: MockDelay,
    pub wdt: CountingKeepalive,
    pub sink: RecordingSink,
    pub lcd: RecordingDisplay,
    pub config: SystemConfig,
    pub now_ms: u32,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: SystemConfig, moisture: i32) -> Self {
        let board = RelayBoard::new(
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            MockPin::default(),
            config.relay_polarity,
        );
        let probe = MockProbe {
            value: moisture,
            ..MockProbe::default()
        };
        let mut hw = HardwareAdapter::new(probe, board);
        let mut sink = RecordingSink::default();
        let mut app = AppService::new(config.clone());
        app.start(0, 0, &mut hw, &mut sink);
        Self {
            app,
            hw,
            delay: MockDelay::default(),
            wdt: CountingKeepalive::default(),
            sink,
            lcd: RecordingDisplay::default(),
            config,
            now_ms: 0,
        }
    }

    pub fn with_defaults(moisture: i32) -> Self {
        Self::new(SystemConfig::default(), moisture)
    }

    pub fn set_moisture(&mut self, raw: i32) {
        self.hw.probe_mut().value = raw;
    }

    pub fn tick_at(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
        self.app.tick(
            now_ms,
            &mut self.hw,
            &mut self.delay,
            &mut self.wdt,
            &mut self.sink,
            &mut self.lcd,
        );
    }

    /// Tick every `step_ms` for `duration_ms`.
    pub fn advance(&mut self, duration_ms: u32, step_ms: u32) {
        let end = self.now_ms.wrapping_add(duration_ms);
        while self.now_ms != end {
            let step = step_ms.min(end.wrapping_sub(self.now_ms));
            let next = self.now_ms.wrapping_add(step);
            self.tick_at(next);
        }
    }

    /// Jump straight to the next sensor read and run that tick.
    pub fn next_read(&mut self) {
        let interval = if self.app.state() == StateId::Idle {
            self.config.idle_read_interval_ms
        } else {
            self.config.read_interval_ms
        };
        let due = self.app.data().last_read_ms.wrapping_add(interval);
        self.tick_at(due);
    }

    pub fn state(&self) -> StateId {
        self.app.state()
    }

    /// Whether the relay line for `device` is at its energised level.
    pub fn energised(&self, device: Device) -> bool {
        let on_level = RelayChannel::<MockPin>::level(self.config.relay_polarity, true);
        let pin = self.hw.board().channel(device).pin();
        pin.high == (on_level == PinState::High)
    }

    pub fn any_energised(&self) -> bool {
        Device::ALL.iter().any(|&d| self.energised(d))
    }

    pub fn writes(&self, device: Device) -> u32 {
        self.hw.board().channel(device).pin().writes
    }
}
