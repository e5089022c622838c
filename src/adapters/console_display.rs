//! Text-only display adapter.
//!
//! Implements [`DisplayPort`] by logging each frame, with glyphs replaced
//! by ASCII stand-ins.  Used on boards without the I2C character panel and
//! for host simulation.  Identical consecutive frames are suppressed.

use log::debug;

use crate::app::ports::DisplayPort;
use crate::display::LcdFrame;

#[derive(Default)]
pub struct ConsoleDisplay {
    last: Option<LcdFrame>,
    frames: u32,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames actually written (after de-duplication).
    pub fn frames_written(&self) -> u32 {
        self.frames
    }
}

impl DisplayPort for ConsoleDisplay {
    fn show(&mut self, frame: &LcdFrame) {
        if self.last.as_ref() == Some(frame) {
            return;
        }
        debug!("LCD | {}{:<15}", frame.glyph.ascii(), frame.line1.as_str());
        debug!("LCD | {:<16}", frame.line2.as_str());
        self.frames = self.frames.wrapping_add(1);
        self.last = Some(frame.clone());
    }
}
