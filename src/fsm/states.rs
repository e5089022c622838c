//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!         ┌──[moisture ≥ dry]──▶ WATERING ──[< dry-hyst | pump time]──┐
//!  IDLE ──┤                                                           ├──▶ COOLDOWN
//!    ▲    └──[moisture ≤ wet]──▶ VENTILATING ──[> wet+hyst | fan time]┘       │
//!    │                                                                        │
//!    └──────────────────────────────[cooldown time]───────────────────────────┘
//!
//!  Any state ──[consecutive errors ≥ max]──▶ ERROR ──[clean read]──▶ IDLE
//! ```
//!
//! Thresholds are inclusive on entry and strict on exit, so a reading that
//! sits exactly on a hysteresis edge never flips the state back and forth.

use log::{info, warn};

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::app::ports::{ActuatorPort, Device};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table<A: ActuatorPort>() -> [StateDescriptor<A>; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: StateId::Idle.name(),
            on_enter: Some(idle_enter::<A>),
            on_moisture: Some(idle_moisture),
            on_timer: None,
        },
        // Index 1 — Watering
        StateDescriptor {
            id: StateId::Watering,
            name: StateId::Watering.name(),
            on_enter: Some(watering_enter::<A>),
            on_moisture: Some(watering_moisture),
            on_timer: Some(watering_timer),
        },
        // Index 2 — Ventilating
        StateDescriptor {
            id: StateId::Ventilating,
            name: StateId::Ventilating.name(),
            on_enter: Some(ventilating_enter::<A>),
            on_moisture: Some(ventilating_moisture),
            on_timer: Some(ventilating_timer),
        },
        // Index 3 — Cooldown
        StateDescriptor {
            id: StateId::Cooldown,
            name: StateId::Cooldown.name(),
            on_enter: Some(cooldown_enter::<A>),
            on_moisture: None,
            on_timer: Some(cooldown_timer),
        },
        // Index 4 — Error
        StateDescriptor {
            id: StateId::Error,
            name: StateId::Error.name(),
            on_enter: Some(error_enter::<A>),
            on_moisture: None,
            on_timer: Some(error_timer),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter<A: ActuatorPort>(ctx: &mut FsmContext, _act: &mut A) {
    info!("STATE | idle, monitoring (moisture {})", ctx.moisture());
}

fn idle_moisture(ctx: &FsmContext) -> Option<StateId> {
    let m = ctx.moisture();
    if m >= ctx.config.moisture_dry_threshold {
        Some(StateId::Watering)
    } else if m <= ctx.config.moisture_wet_threshold {
        Some(StateId::Ventilating)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  WATERING state
// ═══════════════════════════════════════════════════════════════════════════

fn watering_enter<A: ActuatorPort>(_ctx: &mut FsmContext, act: &mut A) {
    act.start(Device::Pump);
}

fn watering_moisture(ctx: &FsmContext) -> Option<StateId> {
    let exit_below = ctx
        .config
        .moisture_dry_threshold
        .saturating_sub(ctx.config.hysteresis);
    (ctx.moisture() < exit_below).then_some(StateId::Cooldown)
}

fn watering_timer(ctx: &FsmContext) -> Option<StateId> {
    if ctx.elapsed_in_state_ms() >= ctx.config.pump_run_time_ms {
        info!("STATE | pump run limit reached");
        Some(StateId::Cooldown)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  VENTILATING state
// ═══════════════════════════════════════════════════════════════════════════

fn ventilating_enter<A: ActuatorPort>(_ctx: &mut FsmContext, act: &mut A) {
    act.start(Device::Fan);
}

fn ventilating_moisture(ctx: &FsmContext) -> Option<StateId> {
    let exit_above = ctx
        .config
        .moisture_wet_threshold
        .saturating_add(ctx.config.hysteresis);
    (ctx.moisture() > exit_above).then_some(StateId::Cooldown)
}

fn ventilating_timer(ctx: &FsmContext) -> Option<StateId> {
    if ctx.elapsed_in_state_ms() >= ctx.config.fan_run_time_ms {
        info!("STATE | fan run limit reached");
        Some(StateId::Cooldown)
    } else {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter<A: ActuatorPort>(ctx: &mut FsmContext, _act: &mut A) {
    info!("STATE | cooldown for {} ms", ctx.config.cooldown_time_ms);
}

fn cooldown_timer(ctx: &FsmContext) -> Option<StateId> {
    (ctx.elapsed_in_state_ms() >= ctx.config.cooldown_time_ms).then_some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR state
// ═══════════════════════════════════════════════════════════════════════════

/// Relays were already shut down by the engine before the state flag moved.
fn error_enter<A: ActuatorPort>(ctx: &mut FsmContext, _act: &mut A) {
    warn!(
        "STATE | error, all relays OFF ({} consecutive errors)",
        ctx.data.consecutive_errors
    );
}

/// Leave only once a clean reading has cleared the flag *and* the counter.
fn error_timer(ctx: &FsmContext) -> Option<StateId> {
    (!ctx.data.sensor_error && ctx.data.consecutive_errors == 0).then_some(StateId::Idle)
}
