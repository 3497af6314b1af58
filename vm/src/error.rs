//! Fatal conditions raised by the interpreter.
//!
//! None of them is recovered internally. Once an `Error` leaves `Chip8` the
//! running program is considered halted and it is up to the host to report it.

use core::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Fetched word does not decode to any CHIP-8 instruction
    UnknownInstruction(u16),
    /// `00EE` executed with an empty call stack
    StackUnderflow,
    /// `2NNN` executed with every stack slot in use
    StackOverflow,
    /// Program image does not fit between 0x200 and the end of memory
    CapacityExceeded { size: usize, capacity: usize },
    /// Rejected frame rate or clock speed
    Configuration(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::UnknownInstruction(raw) => write!(f, "unknown instruction 0x{:04X}", raw),
            Error::StackUnderflow => write!(f, "can't return, call stack is empty"),
            Error::StackOverflow => write!(f, "can't enter subroutine, call stack is full"),
            Error::CapacityExceeded { size, capacity } => write!(
                f,
                "program is {} bytes, only {} bytes of memory are available",
                size, capacity
            ),
            Error::Configuration(what) => write!(f, "invalid configuration: {}", what),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
