#![no_std]
#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod builder;
pub mod chip8;
pub mod error;
pub mod frame;
pub mod memory;
pub mod opcode;
pub mod timer;

pub use builder::Builder;
pub use chip8::Chip8;
pub use error::Error;
pub use frame::{Frame, FrameView, HEIGHT, WIDTH};
pub use opcode::OpCode;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
