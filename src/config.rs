use std::path::PathBuf;

use chip8_vm::chip8::{DEFAULT_CLOCK_SPEED, DEFAULT_FRAME_RATE};
use clap::Parser;

/// Runs a CHIP-8 program in the terminal
///
/// Keypad is mapped onto the left side of a QWERTY keyboard:
///
///   1 2 3 C      1 2 3 4
///   4 5 6 D      Q W E R
///   7 8 9 E      A S D F
///   A 0 B F      Z X C V
///
/// Esc quits.
#[derive(Parser, Debug)]
#[command(version, verbatim_doc_comment)]
pub struct Args {
    /// Path to the program image
    pub rom: PathBuf,

    /// Frames per second, timers keep ticking at 60 Hz regardless
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    pub fps: u32,

    /// Instructions per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_SPEED)]
    pub clock_speed: u32,

    /// Run without touching the terminal, no input and no output
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Seed for the random number instruction, taken from the clock if absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter, e.g. `debug` or `chip8_vm=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}
