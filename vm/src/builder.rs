use crate::chip8::{Chip8, DEFAULT_CLOCK_SPEED, DEFAULT_FRAME_RATE};
use crate::error::Error;

/// Fluent construction of a configured `Chip8`
///
/// Only the program is mandatory, everything else falls back to the defaults
/// of `Chip8::new`.
pub struct Builder<'a> {
    program: Option<&'a [u8]>,
    frame_rate: u32,
    clock_speed: u32,
    seed: u128,
}

impl<'a> Builder<'a> {
    pub fn new() -> Self {
        Self {
            program: None,
            frame_rate: DEFAULT_FRAME_RATE,
            clock_speed: DEFAULT_CLOCK_SPEED,
            seed: 0,
        }
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn with_clock_speed(mut self, clock_speed: u32) -> Self {
        self.clock_speed = clock_speed;
        self
    }

    pub fn with_seed(mut self, seed: u128) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<Chip8, Error> {
        let program = self
            .program
            .ok_or(Error::Configuration("program not provided"))?;
        let mut chip = Chip8::new(self.seed);
        chip.set_frame_rate(self.frame_rate)?;
        chip.set_clock_speed(self.clock_speed)?;
        chip.load_program(program)?;
        Ok(chip)
    }
}

impl<'a> Default for Builder<'a> {
    fn default() -> Self {
        Self::new()
    }
}
