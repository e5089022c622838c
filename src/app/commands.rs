//! Inbound commands to the application service.
//!
//! These represent supervisory actions requested from outside the control
//! loop (boot policy, serial console) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::fsm::StateId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Stop pump and fan and reset the control-loop record to its boot
    /// defaults (Idle, mid-scale moisture, cleared counters).
    ResetSystemData,

    /// Force the FSM into a specific state (diagnostics / testing only).
    ForceState(StateId),
}
