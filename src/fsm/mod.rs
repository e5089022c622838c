//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌─────────────┬──────────────┬─────────────┬─────────────┐  │
//! │  │ StateId     │ on_enter     │ on_moisture │ on_timer    │  │
//! │  ├─────────────┼──────────────┼─────────────┼─────────────┤  │
//! │  │ Idle        │ fn(ctx, act) │ fn(ctx)->?  │ —           │  │
//! │  │ Watering    │ fn(ctx, act) │ fn(ctx)->?  │ fn(ctx)->?  │  │
//! │  │ Ventilating │ fn(ctx, act) │ fn(ctx)->?  │ fn(ctx)->?  │  │
//! │  │ Cooldown    │ fn(ctx, act) │ —           │ fn(ctx)->?  │  │
//! │  │ Error       │ fn(ctx, act) │ —           │ fn(ctx)->?  │  │
//! │  └─────────────┴──────────────┴─────────────┴─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never decides *when* to evaluate a state; the application
//! service does.  `on_moisture` runs only right after a fresh, valid
//! sensor read; `on_timer` runs every tick.  Either may return
//! `Some(next)`, which the engine executes with [`Fsm::transition_to`].
//!
//! The current state lives in `FsmContext.data.current_state`, so the whole
//! control-loop record stays in one place.

pub mod context;
pub mod states;

use core::fmt;

use log::info;
use serde::Serialize;

use crate::app::ports::ActuatorPort;
use context::FsmContext;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all possible system states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Watering = 1,
    Ventilating = 2,
    Cooldown = 3,
    Error = 4,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 5;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Watering => "WATERING",
            Self::Ventilating => "VENTILATING",
            Self::Cooldown => "COOLDOWN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Entry action.  Runs exactly once per accepted transition, after the
/// state flag and timers are committed.
pub type StateActionFn<A> = fn(&mut FsmContext, &mut A);

/// Transition check.  Returns `Some(next)` to leave, or `None` to stay.
pub type StateCheckFn = fn(&FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor<A> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<A>>,
    /// Moisture-driven check, evaluated after a fresh valid read.
    pub on_moisture: Option<StateCheckFn>,
    /// Elapsed-time (or recovery) check, evaluated every tick.
    pub on_timer: Option<StateCheckFn>,
}

/// A committed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table; state and timers live in the [`FsmContext`]
/// passed to every call, actuators in the `A` passed alongside it.
pub struct Fsm<A: ActuatorPort> {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor<A>; StateId::COUNT],
}

impl<A: ActuatorPort> Fsm<A> {
    pub fn new(table: [StateDescriptor<A>; StateId::COUNT]) -> Self {
        Self { table }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first tick.
    pub fn start(&mut self, ctx: &mut FsmContext, act: &mut A) {
        let state = ctx.state();
        info!("STATE | starting in {}", self.descriptor(state).name);
        ctx.data.state_start_ms = ctx.now_ms;
        ctx.data.last_state_change_ms = ctx.now_ms;
        if let Some(enter) = self.descriptor(state).on_enter {
            enter(ctx, act);
        }
    }

    pub fn descriptor(&self, id: StateId) -> &StateDescriptor<A> {
        &self.table[id as usize]
    }

    /// Evaluate the current state's moisture-driven transition.
    pub fn check_moisture(&mut self, ctx: &mut FsmContext, act: &mut A) -> Option<Transition> {
        let check = self.descriptor(ctx.state()).on_moisture?;
        let next = check(ctx)?;
        self.transition_to(next, ctx, act)
    }

    /// Evaluate the current state's timed action.
    pub fn run_timer(&mut self, ctx: &mut FsmContext, act: &mut A) -> Option<Transition> {
        let check = self.descriptor(ctx.state()).on_timer?;
        let next = check(ctx)?;
        self.transition_to(next, ctx, act)
    }

    /// Safety override: every relay OFF, then Error.
    ///
    /// While already in Error the shutdown is still re-asserted and the
    /// transition is a no-op.
    pub fn force_error(&mut self, ctx: &mut FsmContext, act: &mut A) -> Option<Transition> {
        act.emergency_shutdown();
        self.transition_to(StateId::Error, ctx, act)
    }

    /// Move to `next`.
    ///
    /// A no-op (no relay writes, no timer reset) when `next` is already the
    /// current state.  Otherwise pump and fan are stopped (every relay when
    /// entering Error) **before** the state flag changes, the state timer is
    /// reset, and the new state's entry action runs.
    pub fn transition_to(
        &mut self,
        next: StateId,
        ctx: &mut FsmContext,
        act: &mut A,
    ) -> Option<Transition> {
        let from = ctx.state();
        if next == from {
            return None;
        }

        info!(
            "STATE | {} -> {}",
            self.descriptor(from).name,
            self.descriptor(next).name
        );

        if next == StateId::Error {
            act.emergency_shutdown();
        } else {
            act.stop_all();
        }

        ctx.data.previous_state = from;
        ctx.data.current_state = next;
        ctx.data.state_start_ms = ctx.now_ms;
        ctx.data.last_state_change_ms = ctx.now_ms;

        if let Some(enter) = self.descriptor(next).on_enter {
            enter(ctx, act);
        }

        Some(Transition { from, to: next })
    }
}
