//! 16x2 character display layouts.
//!
//! Rendering is pure: each function turns domain state into an
//! [`LcdFrame`] that a [`DisplayPort`](crate::app::ports::DisplayPort)
//! adapter pushes to the panel.  Column 0 of the first line is reserved
//! for a custom glyph, so `line1` holds the remaining 15 columns.
//!
//! ```text
//!  ┌────────────────┐
//!  │G M: 42% OK     │   G = glyph, moisture %, status word
//!  │IDLE         12s│   state name (10), elapsed seconds (cols 11..16)
//!  └────────────────┘
//! ```

use core::fmt::Write;

use heapless::String;

use crate::app::events::StatusSnapshot;
use crate::fsm::StateId;

pub const LCD_COLS: usize = 16;

/// Largest elapsed value that fits the 4-column seconds field.
const MAX_ELAPSED_SECS: u32 = 9_999;

/// Icon shown in column 0 of the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    WaterDrop,
    Fan,
    Plant,
    Warning,
}

impl Glyph {
    /// Stand-in character for text-only sinks.
    pub const fn ascii(self) -> char {
        match self {
            Self::WaterDrop => '~',
            Self::Fan => '*',
            Self::Plant => 'Y',
            Self::Warning => '!',
        }
    }
}

/// One full screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcdFrame {
    pub glyph: Glyph,
    /// Columns 1..16 of the first row.
    pub line1: String<{ LCD_COLS - 1 }>,
    pub line2: String<LCD_COLS>,
}

/// Display name of a state, at most 10 columns.
pub const fn short_state_name(state: StateId) -> &'static str {
    match state {
        StateId::Idle => "IDLE",
        StateId::Watering => "WATERING",
        StateId::Ventilating => "VENT",
        StateId::Cooldown => "COOLDOWN",
        StateId::Error => "ERROR",
    }
}

fn glyph_for(s: &StatusSnapshot) -> Glyph {
    if s.sensor_error {
        return Glyph::Warning;
    }
    match s.state {
        StateId::Watering => Glyph::WaterDrop,
        StateId::Ventilating => Glyph::Fan,
        _ => Glyph::Plant,
    }
}

// Each line is sized to the panel and the formats below never exceed it,
// so `write!` into the bounded strings cannot run out of room.  Overflow
// would only truncate the frame, never fail the control loop.

/// Regular status screen.
pub fn render_status(s: &StatusSnapshot) -> LcdFrame {
    let mut line1 = String::new();
    let _ = write!(line1, "M:{:>3}% {}", s.moisture_percent, s.level.short());

    let mut line2 = String::new();
    let secs = s.elapsed_secs().min(MAX_ELAPSED_SECS);
    let _ = write!(line2, "{:<10} {:>4}s", short_state_name(s.state), secs);

    LcdFrame {
        glyph: glyph_for(s),
        line1,
        line2,
    }
}

/// Shown while the sensor is faulted or the system is in Error.
pub fn render_error() -> LcdFrame {
    let mut line1 = String::new();
    let _ = line1.push_str(" SENSOR ERROR");
    let mut line2 = String::new();
    let _ = line2.push_str("Check connection");
    LcdFrame {
        glyph: Glyph::Warning,
        line1,
        line2,
    }
}

/// Boot splash.
pub fn render_startup(version: &str) -> LcdFrame {
    let mut line1 = String::new();
    let _ = line1.push_str(" Greenhouse");
    let mut line2 = String::new();
    let _ = write!(line2, "System v{version} WDT");
    LcdFrame {
        glyph: Glyph::Plant,
        line1,
        line2,
    }
}
