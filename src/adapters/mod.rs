//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements         | Connects to              |
//! |-------------------|--------------------|--------------------------|
//! | `hardware`        | SensorPort         | Moisture probe (ADC)     |
//! |                   | ActuatorPort       | Relay module (GPIO)      |
//! | `log_sink`        | EventSink          | Serial log output        |
//! | `console_display` | DisplayPort        | Serial log output        |
//! | `time`            | —                  | ESP32 system timer       |
//!
//! The watchdog port is implemented by
//! [`drivers::watchdog::EspWatchdog`](crate::drivers::watchdog::EspWatchdog).

pub mod console_display;
pub mod hardware;
pub mod log_sink;
pub mod time;
