//! 4 KiB program store
//!
//! Layout:
//!   0x000-0x04f  unused (interpreter area on the original machines)
//!   0x050-0x09f  hexadecimal font, 16 glyphs of 5 bytes
//!   0x0a0-0x1ff  unused
//!   0x200-0xfff  program
//!
//! Every address is wrapped into the 12-bit address space before use, so
//! no instruction can index past the end of memory.

use log::debug;

use crate::error::Error;

/// How much RAM we have
pub const MEMORY_SIZE: usize = 4096;
/// Where programs are loaded and where execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Largest program image that fits in memory
pub const PROGRAM_CAPACITY: usize = MEMORY_SIZE - PROGRAM_START as usize;
/// Where the font glyphs start
pub const FONT_START: u16 = 0x050;
/// Bytes per font glyph
pub const FONT_GLYPH_SIZE: u16 = 5;

pub(crate) const ADDRESS_MASK: u16 = (MEMORY_SIZE - 1) as u16;

#[rustfmt::skip]
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory([u8; MEMORY_SIZE]);

impl Memory {
    /// Zeroed memory with the font already in place
    pub fn new() -> Self {
        let mut memory = Self([0; MEMORY_SIZE]);
        let font = FONT_START as usize;
        memory.0[font..font + FONT.len()].copy_from_slice(&FONT);
        memory
    }

    /// Copy program image to memory from 0x200 (_start address)
    ///
    /// The size is checked before anything is written, a rejected image leaves
    /// memory as it was.
    pub fn load(&mut self, prog: &[u8]) -> Result<(), Error> {
        if prog.len() > PROGRAM_CAPACITY {
            return Err(Error::CapacityExceeded {
                size: prog.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }
        let start = PROGRAM_START as usize;
        self.0[start..start + prog.len()].copy_from_slice(prog);
        debug!("loaded {} bytes at {:#05x}", prog.len(), PROGRAM_START);
        Ok(())
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.0[(addr & ADDRESS_MASK) as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.0[(addr & ADDRESS_MASK) as usize] = value;
    }

    /// Big-endian two-byte word, the second byte wraps to 0x000 past 0xFFF
    pub fn read_word(&self, addr: u16) -> u16 {
        (self.read(addr) as u16) << 8 | self.read(addr.wrapping_add(1)) as u16
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.0
    }
}
