//! Greenhouse Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   ConsoleDisplay   Clock       │
//! │  (Sensor+Actuator) (EventSink)    (DisplayPort)    (ms ticks)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Moisture pipeline · FSM · timers                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SafetySupervisor (task watchdog · reset-cause diagnosis)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::info;

use greenhouse::FIRMWARE_VERSION;
use greenhouse::adapters::console_display::ConsoleDisplay;
use greenhouse::adapters::hardware::{HardwareAdapter, RelayBoard};
use greenhouse::adapters::log_sink::LogEventSink;
use greenhouse::adapters::time::MonotonicClock;
use greenhouse::app::events::AppEvent;
use greenhouse::app::ports::{DisplayPort, EventSink};
use greenhouse::app::service::AppService;
use greenhouse::config::SystemConfig;
use greenhouse::display;
use greenhouse::drivers::adc::MoistureAdc;
use greenhouse::drivers::watchdog::EspWatchdog;
use greenhouse::pins;
use greenhouse::safety::SafetySupervisor;

type RelayPin = PinDriver<'static, AnyOutputPin, Output>;

fn relay_pin(gpio: i32) -> Result<RelayPin> {
    // SAFETY: each relay GPIO is claimed exactly once, here, at boot.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    let config = SystemConfig::default();
    config.validate()?;

    // A watchdog left running by a crashed image must not fire mid-setup.
    let mut supervisor = SafetySupervisor::new(EspWatchdog::new(), &config);
    supervisor.disable_watchdog();

    info!("========================================");
    info!("Automatic Greenhouse System v{FIRMWARE_VERSION}");
    info!("With Watchdog & EMI Protection");
    info!("========================================");

    // ── 2. Reset diagnosis ────────────────────────────────────
    let reason = supervisor.classify_last_reset();
    let wdt_resets = supervisor.wdt_reset_count();

    // ── 3. Hardware ───────────────────────────────────────────
    info!("INIT | initialising hardware");
    let board = RelayBoard::new(
        relay_pin(pins::RELAY_PUMP_GPIO)?,
        relay_pin(pins::RELAY_FAN_GPIO)?,
        relay_pin(pins::RELAY_AUX1_GPIO)?,
        relay_pin(pins::RELAY_AUX2_GPIO)?,
        config.relay_polarity,
    );
    let probe = MoistureAdc::new(pins::SOIL_MOISTURE_ADC_CHANNEL)?;
    let mut hw = HardwareAdapter::new(probe, board);

    let mut sink = LogEventSink::new();
    let mut lcd = ConsoleDisplay::new();
    let clock = MonotonicClock::new();
    let mut delay = FreeRtos;

    sink.emit(&AppEvent::Boot { reason, wdt_resets });

    // ── 4. Application core ───────────────────────────────────
    let mut app = AppService::new(config.clone());
    app.start(clock.uptime_ms(), wdt_resets, &mut hw, &mut sink);
    info!("INIT | complete");

    lcd.show(&display::render_startup(FIRMWARE_VERSION));
    supervisor.bounded_wait(config.startup_screen_ms, &mut delay);

    // Armed last so slow initialisation can't trip it.
    supervisor.arm_watchdog(config.watchdog_timeout_ms);

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        app.tick(
            clock.uptime_ms(),
            &mut hw,
            &mut delay,
            &mut supervisor,
            &mut sink,
            &mut lcd,
        );
        supervisor.bounded_wait(config.loop_interval_ms, &mut delay);
    }
}
