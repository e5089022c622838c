//! Single relay channel on a digital output line.
//!
//! The 4-channel relay module is opto-isolated and, on the common boards,
//! energised by pulling its input LOW.  This driver is the only place that
//! knows about that: callers speak in "on"/"off" and the channel translates
//! through [`RelayPolarity`].
//!
//! ## Safety contract
//!
//! The channel does not remember what it last wrote; every call drives the
//! line.  Tracking and idempotence live one level up in
//! [`RelayBoard`](crate::adapters::hardware::RelayBoard).

use embedded_hal::digital::{OutputPin, PinState};

use crate::app::ports::Device;
use crate::config::RelayPolarity;
use crate::error::ActuatorError;

pub struct RelayChannel<P: OutputPin> {
    pin: P,
    polarity: RelayPolarity,
    device: Device,
}

impl<P: OutputPin> RelayChannel<P> {
    pub fn new(pin: P, polarity: RelayPolarity, device: Device) -> Self {
        Self {
            pin,
            polarity,
            device,
        }
    }

    /// Electrical level that corresponds to the logical `on` state.
    pub const fn level(polarity: RelayPolarity, on: bool) -> PinState {
        match (polarity, on) {
            (RelayPolarity::ActiveLow, true) | (RelayPolarity::ActiveHigh, false) => PinState::Low,
            (RelayPolarity::ActiveLow, false) | (RelayPolarity::ActiveHigh, true) => PinState::High,
        }
    }

    pub fn write(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(Self::level(self.polarity, on))
            .map_err(|_| ActuatorError::GpioWriteFailed(self.device))
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
