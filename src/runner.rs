use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use chip8_vm::{Builder, Chip8};
use log::{error, info};
use spin_sleep::LoopHelper;

use crate::config::Args;
use crate::error::{Error, Result};
use crate::frontend::Frontend;

/// Read the program image and build a machine configured from `args`
pub fn load(args: &Args) -> Result<Chip8> {
    let program = fs::read(&args.rom).map_err(|source| Error::Rom {
        path: args.rom.clone(),
        source,
    })?;
    info!("loaded {:?}, {} bytes", args.rom, program.len());
    let seed = args.seed.map(u128::from).unwrap_or_else(clock_seed);
    let chip = Builder::new()
        .with_program(&program)
        .with_frame_rate(args.fps)
        .with_clock_speed(args.clock_speed)
        .with_seed(seed)
        .build()?;
    Ok(chip)
}

fn clock_seed() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0)
}

/// Paced frame loop tying a `Chip8` to a `Frontend`
pub struct Runner<F: Frontend> {
    chip: Chip8,
    frontend: F,
    frame_limit: Option<u64>,
}

impl<F: Frontend> Runner<F> {
    pub fn new(chip: Chip8, frontend: F) -> Self {
        Self {
            chip,
            frontend,
            frame_limit: None,
        }
    }

    pub fn with_frame_limit(mut self, frames: Option<u64>) -> Self {
        self.frame_limit = frames;
        self
    }

    /// Run until the frontend quits, the frame limit is reached or the
    /// interpreter fails. Returns the number of frames executed.
    pub fn run(&mut self) -> Result<u64> {
        let mut loop_helper =
            LoopHelper::builder().build_with_target_rate(self.chip.frame_rate() as f64);
        let mut frames = 0u64;

        while self.frame_limit.map_or(true, |limit| frames < limit) {
            loop_helper.loop_start();

            if !self.frontend.poll(self.chip.keys_mut())? {
                info!("quit requested after {} frames", frames);
                break;
            }
            if self.chip.consume_draw_flag() {
                self.frontend.render(self.chip.display())?;
            }
            self.frontend.set_tone(self.chip.should_beep())?;
            if let Err(err) = self.chip.execute_frame() {
                error!("halted at {:#05x}: {}", self.chip.last_fetch(), err);
                return Err(err.into());
            }
            frames += 1;

            loop_helper.loop_sleep();
        }
        Ok(frames)
    }

    pub fn chip(&self) -> &Chip8 {
        &self.chip
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn frontend_mut(&mut self) -> &mut F {
        &mut self.frontend
    }
}
