//! Boot-path tests for the safety supervisor over the simulated TWDT.

use greenhouse::app::ports::WatchdogPort;
use greenhouse::config::SystemConfig;
use greenhouse::drivers::watchdog::EspWatchdog;
use greenhouse::safety::{ResetFlags, ResetReason, SafetySupervisor};

use crate::mock_hw::{Harness, MockDelay};

fn boot(flags: u8, tally: u8) -> SafetySupervisor<EspWatchdog> {
    let wdt = EspWatchdog::sim_with_reset(ResetFlags(flags), tally);
    SafetySupervisor::new(wdt, &SystemConfig::default())
}

#[test]
fn boot_sequence_arms_only_after_startup_wait() {
    let config = SystemConfig::default();
    let mut s = boot(ResetFlags::POWER_ON, 0);
    let mut delay = MockDelay::default();

    s.disable_watchdog();
    assert_eq!(s.classify_last_reset(), ResetReason::PowerOn);
    assert!(!s.is_armed());

    s.bounded_wait(config.startup_screen_ms, &mut delay);
    assert_eq!(delay.total_ms, 2_000);
    assert!(!s.watchdog().is_subscribed());

    s.arm_watchdog(config.watchdog_timeout_ms);
    assert!(s.watchdog().is_subscribed());
    assert_eq!(s.watchdog().sim_timeout_ms(), Some(2_000));
}

#[test]
fn repeated_watchdog_resets_accumulate() {
    let mut tally = 0;
    for expected in 1..=3 {
        let mut s = boot(ResetFlags::WATCHDOG | ResetFlags::POWER_ON, tally);
        assert_eq!(s.classify_last_reset(), ResetReason::Watchdog);
        tally = s.wdt_reset_count();
        assert_eq!(tally, expected);
    }

    let mut s = boot(ResetFlags::POWER_ON, tally);
    s.classify_last_reset();
    assert_eq!(s.wdt_reset_count(), 0);
}

#[test]
fn bounded_wait_never_leaves_a_long_gap() {
    let mut s = boot(ResetFlags::POWER_ON, 0);
    let mut delay = MockDelay::default();
    s.arm_watchdog(2_000);
    let before = s.watchdog().sim_feeds();
    s.bounded_wait(95, &mut delay);
    // 10 slices + trailing feed.
    assert_eq!(s.watchdog().sim_feeds() - before, 11);
}

#[test]
fn supervisor_feeds_during_control_loop() {
    let mut s = boot(ResetFlags::POWER_ON, 0);
    s.arm_watchdog(2_000);
    let mut h = Harness::with_defaults(500);

    h.app.tick(
        5_000,
        &mut h.hw,
        &mut h.delay,
        &mut s,
        &mut h.sink,
        &mut h.lcd,
    );
    assert!(s.watchdog().sim_feeds() >= 4 + 4);
}

#[test]
fn disarm_unsubscribes() {
    let mut wdt = EspWatchdog::new();
    wdt.arm(1_000);
    wdt.disarm();
    assert_eq!(wdt.sim_timeout_ms(), None);
}

#[test]
fn boot_disable_stops_a_watchdog_inherited_from_the_last_image() {
    let mut s = SafetySupervisor::new(EspWatchdog::sim_left_armed(300), &SystemConfig::default());
    assert_eq!(s.watchdog().sim_timeout_ms(), Some(300));

    s.disable_watchdog();
    assert_eq!(s.watchdog().sim_timeout_ms(), None);
    assert!(!s.is_armed());
}
