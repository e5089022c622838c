//! Integration tests for the AppService → FSM → relay board pipeline.
//!
//! These run on the host (x86_64) and verify the per-tick orchestration
//! (read cadence, event stream, display refresh, commands) against the
//! real relay board driving mock lines.

use greenhouse::app::commands::AppCommand;
use greenhouse::app::events::AppEvent;
use greenhouse::app::ports::{ActuatorPort, Device};
use greenhouse::display::Glyph;
use greenhouse::fsm::StateId;

use crate::mock_hw::Harness;

#[test]
fn starts_idle_with_everything_off() {
    let h = Harness::with_defaults(500);
    assert_eq!(h.state(), StateId::Idle);
    assert!(!h.any_energised());
    assert_eq!(h.sink.events, [AppEvent::Started(StateId::Idle)]);
}

#[test]
fn idle_reads_every_five_seconds() {
    let mut h = Harness::with_defaults(500);
    h.advance(4_990, 10);
    assert_eq!(h.hw.probe_mut().samples, 0);

    h.advance(10, 10);
    assert_eq!(h.hw.probe_mut().samples, 10);
    assert_eq!(h.app.data().last_read_ms, 5_000);
}

#[test]
fn every_read_emits_a_status_snapshot() {
    let mut h = Harness::with_defaults(480);
    h.next_read();
    let status = h.sink.events.iter().find_map(|e| match e {
        AppEvent::Status(s) => Some(*s),
        _ => None,
    });
    let status = status.expect("status event");
    assert_eq!(status.moisture, 480);
    assert_eq!(status.state, StateId::Idle);
    assert!(!status.pump_on);
    assert_eq!(status.consecutive_errors, 0);
}

#[test]
fn rejected_reads_are_reported() {
    let mut h = Harness::with_defaults(5_000);
    h.next_read();
    h.set_moisture(900);
    h.next_read();

    assert!(h.sink.events.contains(&AppEvent::SensorFault {
        median: 5_000,
        consecutive: 1
    }));
    assert!(h.sink.events.contains(&AppEvent::SpikeRejected {
        reading: 900,
        previous: 512,
        consecutive: 2
    }));
}

#[test]
fn previous_moisture_tracks_value_before_read() {
    let mut h = Harness::with_defaults(600);
    h.next_read();
    assert_eq!(h.app.data().previous_moisture, 512);
    h.set_moisture(620);
    h.next_read();
    assert_eq!(h.app.data().previous_moisture, 600);
    assert_eq!(h.app.data().current_moisture, 620);
}

#[test]
fn watchdog_is_fed_during_every_tick() {
    let mut h = Harness::with_defaults(500);
    h.tick_at(10);
    let idle_feeds = h.wdt.feeds;
    assert!(idle_feeds >= 2);

    h.next_read();
    // Sampling feeds at i = 0, 3, 6, 9 on top of the per-phase feeds.
    assert!(h.wdt.feeds - idle_feeds >= idle_feeds + 4);
    assert_eq!(h.delay.total_ms, 10 * 5);
}

#[test]
fn display_refreshes_on_its_own_cadence() {
    let mut h = Harness::with_defaults(500);
    h.advance(2_000, 100);
    // 500, 1000, 1500, 2000
    assert_eq!(h.lcd.frames.len(), 4);
    let last = h.lcd.frames.last().expect("frame");
    assert_eq!(last.glyph, Glyph::Plant);
    assert_eq!(last.line2.as_str(), "IDLE          2s");
}

#[test]
fn transition_refreshes_display_immediately() {
    let mut h = Harness::with_defaults(650);
    h.next_read();
    h.set_moisture(760);
    let before = h.lcd.frames.len();
    h.next_read();
    assert_eq!(h.state(), StateId::Watering);
    assert!(h.lcd.frames.len() > before);
    assert_eq!(h.lcd.frames.last().map(|f| f.glyph), Some(Glyph::WaterDrop));
}

#[test]
fn transition_to_current_state_touches_nothing() {
    let mut h = Harness::with_defaults(650);
    h.app.handle_command(
        AppCommand::ForceState(StateId::Watering),
        100,
        &mut h.hw,
        &mut h.sink,
        &mut h.lcd,
    );
    let writes = h.writes(Device::Pump);
    let data = *h.app.data();
    let events = h.sink.events.len();

    let moved = h
        .app
        .transition_to(StateId::Watering, 900, &mut h.hw, &mut h.sink, &mut h.lcd);
    assert!(!moved);
    assert_eq!(h.writes(Device::Pump), writes);
    assert_eq!(h.app.data().state_start_ms, data.state_start_ms);
    assert_eq!(h.sink.events.len(), events);
}

#[test]
fn forced_state_switch_stops_previous_actuator() {
    let mut h = Harness::with_defaults(500);
    h.app.handle_command(
        AppCommand::ForceState(StateId::Watering),
        0,
        &mut h.hw,
        &mut h.sink,
        &mut h.lcd,
    );
    h.app.handle_command(
        AppCommand::ForceState(StateId::Ventilating),
        10,
        &mut h.hw,
        &mut h.sink,
        &mut h.lcd,
    );
    assert!(!h.energised(Device::Pump));
    assert!(h.energised(Device::Fan));
    assert_eq!(h.app.data().previous_state, StateId::Watering);
}

#[test]
fn entering_error_also_kills_reserved_relays() {
    let mut h = Harness::with_defaults(500);
    h.hw.start(Device::Aux1);
    h.hw.start(Device::Aux2);
    assert!(h.energised(Device::Aux1));

    h.app
        .transition_to(StateId::Error, 0, &mut h.hw, &mut h.sink, &mut h.lcd);
    assert!(!h.any_energised());
    assert!(!h.hw.is_running(Device::Aux1));
}

#[test]
fn reset_command_restores_boot_defaults() {
    let mut h = Harness::with_defaults(-1);
    for _ in 0..5 {
        h.next_read();
    }
    assert_eq!(h.state(), StateId::Error);

    h.app.handle_command(
        AppCommand::ResetSystemData,
        h.now_ms,
        &mut h.hw,
        &mut h.sink,
        &mut h.lcd,
    );
    assert_eq!(h.state(), StateId::Idle);
    assert_eq!(h.app.data().consecutive_errors, 0);
    assert!(!h.app.data().sensor_error);
    assert_eq!(h.app.data().current_moisture, 512);
    assert_eq!(
        h.sink.transitions().last(),
        Some(&(StateId::Error, StateId::Idle))
    );
}

#[test]
fn clock_wrap_does_not_stall_reads() {
    let mut h = Harness::with_defaults(500);
    h.tick_at(u32::MAX - 1_000);
    assert_eq!(h.app.data().last_read_ms, u32::MAX - 1_000);

    // 5 s later, across the wrap.
    h.tick_at(3_999);
    assert_eq!(h.app.data().last_read_ms, 3_999);
}
