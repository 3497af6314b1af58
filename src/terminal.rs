use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use chip8_vm::{chip8::KEY_COUNT, FrameView, HEIGHT, WIDTH};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, warn};

use crate::error::Result;
use crate::frontend::Frontend;

/// Left-hand side of a QWERTY keyboard, laid out like the COSMAC keypad
const CONVENTIONAL_KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// How long a key counts as held after its last press event
///
/// Terminals only report presses (and auto-repeat), never releases.
pub const HOLD_WINDOW: Duration = Duration::from_millis(150);

const LIT: &str = "██";
const UNLIT: &str = "  ";
const BELL: &str = "\x07";

pub fn map_key(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    CONVENTIONAL_KEYMAP
        .iter()
        .find(|&&(k, _)| k == c)
        .map(|&(_, key)| key)
}

/// Emulated key release on top of press-only input
#[derive(Debug, Default)]
pub struct KeyLatch {
    last_press: [Option<Instant>; KEY_COUNT],
}

impl KeyLatch {
    pub fn press(&mut self, key: u8, at: Instant) {
        if let Some(slot) = self.last_press.get_mut(key as usize) {
            *slot = Some(at);
        }
    }

    pub fn fill(&self, keys: &mut [bool; KEY_COUNT], now: Instant) {
        for (state, last) in keys.iter_mut().zip(self.last_press.iter()) {
            *state = matches!(last, Some(at) if now.saturating_duration_since(*at) < HOLD_WINDOW);
        }
    }
}

/// Full-screen frontend drawing into the terminal
///
/// Enters the alternate screen in raw mode, both are undone on drop.
pub struct TerminalFrontend {
    stdout: Stdout,
    latch: KeyLatch,
    tone: bool,
}

impl TerminalFrontend {
    pub fn new() -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        debug!("terminal frontend ready");
        Ok(Self {
            stdout,
            latch: KeyLatch::default(),
            tone: false,
        })
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let screen = execute!(self.stdout, Show, LeaveAlternateScreen);
        let raw_mode = terminal::disable_raw_mode();
        if screen.is_err() || raw_mode.is_err() {
            warn!("failed to restore terminal");
        }
    }
}

impl Frontend for TerminalFrontend {
    fn poll(&mut self, keys: &mut [bool; KEY_COUNT]) -> Result<bool> {
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Esc => return Ok(false),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(false)
                    }
                    KeyCode::Char(c) => match map_key(c) {
                        Some(mapped) => self.latch.press(mapped, Instant::now()),
                        None => debug!("can't map {:?} to a CHIP-8 key", c),
                    },
                    _ => {}
                }
            }
        }
        self.latch.fill(keys, Instant::now());
        Ok(true)
    }

    fn render(&mut self, frame: FrameView<'_>) -> Result<()> {
        for y in 0..HEIGHT {
            let row: String = (0..WIDTH)
                .map(|x| if frame.pixel(x, y) { LIT } else { UNLIT })
                .collect();
            queue!(self.stdout, MoveTo(0, y as u16), Print(row))?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    fn set_tone(&mut self, on: bool) -> Result<()> {
        if on && !self.tone {
            queue!(self.stdout, Print(BELL))?;
            self.stdout.flush()?;
        }
        self.tone = on;
        Ok(())
    }
}
