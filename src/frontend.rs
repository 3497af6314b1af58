use chip8_vm::{chip8::KEY_COUNT, FrameView};

use crate::error::Result;

/// Everything the interpreter needs from the outside world
///
/// The runner calls these once per frame, in order: `poll`, `render` (only
/// when the display changed), `set_tone`.
pub trait Frontend {
    /// Write the current key states into `keys`, `false` when the user asked to quit
    fn poll(&mut self, keys: &mut [bool; KEY_COUNT]) -> Result<bool>;

    fn render(&mut self, frame: FrameView<'_>) -> Result<()>;

    /// Called every frame with the desired tone state, not only on changes
    fn set_tone(&mut self, on: bool) -> Result<()>;
}

/// Frontend without a terminal
///
/// Keys can be held programmatically, rendered frames and tone changes are
/// only counted.
#[derive(Debug, Default)]
pub struct HeadlessFrontend {
    keys: [bool; KEY_COUNT],
    rendered: u64,
    tone: bool,
    tone_starts: u64,
}

impl HeadlessFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(key as usize) {
            *state = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(key as usize) {
            *state = false;
        }
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn tone(&self) -> bool {
        self.tone
    }

    pub fn tone_starts(&self) -> u64 {
        self.tone_starts
    }
}

impl Frontend for HeadlessFrontend {
    fn poll(&mut self, keys: &mut [bool; KEY_COUNT]) -> Result<bool> {
        *keys = self.keys;
        Ok(true)
    }

    fn render(&mut self, _frame: FrameView<'_>) -> Result<()> {
        self.rendered += 1;
        Ok(())
    }

    fn set_tone(&mut self, on: bool) -> Result<()> {
        if on && !self.tone {
            self.tone_starts += 1;
        }
        self.tone = on;
        Ok(())
    }
}
