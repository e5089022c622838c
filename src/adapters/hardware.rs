//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! [`RelayBoard`] owns the four relay channels and implements
//! [`ActuatorPort`] with on/off tracking.  [`HardwareAdapter`] pairs it
//! with the moisture probe so the application service sees one value that
//! is both a [`SensorPort`] and an [`ActuatorPort`].  Pin types are
//! generic over `embedded_hal::digital::OutputPin`, so the same code drives
//! ESP-IDF `PinDriver`s on target and recording mocks on the host.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::app::ports::{ActuatorPort, Device, SensorPort};
use crate::config::RelayPolarity;
use crate::drivers::relay::RelayChannel;

// ── Relay board ───────────────────────────────────────────────

pub struct RelayBoard<P: OutputPin> {
    /// Indexed by `Device::index()`.
    channels: [RelayChannel<P>; Device::COUNT],
    running: [bool; Device::COUNT],
}

impl<P: OutputPin> RelayBoard<P> {
    /// Take ownership of the four lines and drive every relay OFF.
    pub fn new(pump: P, fan: P, aux1: P, aux2: P, polarity: RelayPolarity) -> Self {
        let mut board = Self {
            channels: [
                RelayChannel::new(pump, polarity, Device::Pump),
                RelayChannel::new(fan, polarity, Device::Fan),
                RelayChannel::new(aux1, polarity, Device::Aux1),
                RelayChannel::new(aux2, polarity, Device::Aux2),
            ],
            running: [false; Device::COUNT],
        };
        for device in Device::ALL {
            board.drive(device, false);
        }
        info!("RELAY | initialised, all OFF");
        board
    }

    pub fn channel(&self, device: Device) -> &RelayChannel<P> {
        &self.channels[device.index()]
    }

    /// Write failures are logged and otherwise ignored; the control loop
    /// has no better recovery than trying again on the next command.
    fn drive(&mut self, device: Device, on: bool) {
        if let Err(e) = self.channels[device.index()].write(on) {
            error!("RELAY | {e}");
        }
    }
}

impl<P: OutputPin> ActuatorPort for RelayBoard<P> {
    fn start(&mut self, device: Device) {
        self.drive(device, true);
        let was_running = core::mem::replace(&mut self.running[device.index()], true);
        if !was_running {
            info!("RELAY | {device} ON");
        }
    }

    fn stop(&mut self, device: Device) {
        self.drive(device, false);
        let was_running = core::mem::replace(&mut self.running[device.index()], false);
        if was_running {
            info!("RELAY | {device} OFF");
        }
    }

    fn is_running(&self, device: Device) -> bool {
        self.running[device.index()]
    }

    fn stop_all(&mut self) {
        self.stop(Device::Pump);
        self.stop(Device::Fan);
    }

    fn emergency_shutdown(&mut self) {
        for device in Device::ALL {
            self.drive(device, false);
        }
        self.running = [false; Device::COUNT];
        info!("RELAY | emergency shutdown, all OFF");
    }
}

// ── Combined adapter ──────────────────────────────────────────

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<S: SensorPort, P: OutputPin> {
    probe: S,
    board: RelayBoard<P>,
}

impl<S: SensorPort, P: OutputPin> HardwareAdapter<S, P> {
    pub fn new(probe: S, board: RelayBoard<P>) -> Self {
        Self { probe, board }
    }

    pub fn probe_mut(&mut self) -> &mut S {
        &mut self.probe
    }

    pub fn board(&self) -> &RelayBoard<P> {
        &self.board
    }
}

impl<S: SensorPort, P: OutputPin> SensorPort for HardwareAdapter<S, P> {
    fn sample(&mut self) -> i32 {
        self.probe.sample()
    }
}

impl<S: SensorPort, P: OutputPin> ActuatorPort for HardwareAdapter<S, P> {
    fn start(&mut self, device: Device) {
        self.board.start(device);
    }

    fn stop(&mut self, device: Device) {
        self.board.stop(device);
    }

    fn is_running(&self, device: Device) -> bool {
        self.board.is_running(device)
    }

    fn stop_all(&mut self) {
        self.board.stop_all();
    }

    fn emergency_shutdown(&mut self) {
        self.board.emergency_shutdown();
    }
}
