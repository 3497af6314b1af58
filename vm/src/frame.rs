use bitvec::prelude::*;
#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
const ROW_LENGTH: usize = WIDTH / 8;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// An opaque struct holding the CHIP-8 display
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

/// A shared, live view over a `Frame`
///
/// Each pixel is represented either by a corresponding bit being set, or by `true` value.
/// Internally, the data is stored in a form of concatenating rows from top to bottom of the frame.
/// Rows are represented as an individual bits of continuous memory, matching the state of pixels
/// from left to the right.
///
/// The view borrows the interpreter, so it cannot outlive the next executed cycle.
///
/// #Note:
/// Can return ImageRaw instance with `embedded-graphics` feature on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw memory of a frame
    pub fn as_raw(&self) -> &[u8] {
        self.0
    }

    /// Create an owned copy of a frame
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// Access frame's bits by indexes, `None` outside of 64x32
    pub fn get_bit(&self, x: usize, y: usize) -> Option<bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .and_then(|row| row.get(x))
            .copied()
    }

    /// State of the pixel, coordinates wrap around the screen edges
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.iter_rows_as_bitslices()
            .nth(y % HEIGHT)
            .map(|row| row[x % WIDTH])
            .unwrap_or(false)
    }

    /// Get iterator over rows in a form of a `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        self.0.chunks(ROW_LENGTH).map(|row| row.view_bits::<Msb0>())
    }

    /// Unpack the frame into a `[row][column]` grid of booleans
    pub fn to_grid(&self) -> [[bool; WIDTH]; HEIGHT] {
        let mut grid = [[false; WIDTH]; HEIGHT];
        for (y, row) in grid.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = self.pixel(x, y);
            }
        }
        grid
    }

    /// Number of lit pixels
    pub fn lit_count(&self) -> usize {
        self.0.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    /// Get `ImageRaw` structure from frame's data
    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'_, BinaryColor> {
        ImageRaw::new(self.as_raw(), WIDTH as u32, HEIGHT as u32)
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get view over frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    /// Flip the pixel, coordinates wrap around the screen edges
    ///
    /// Returns whether the pixel was lit before the flip.
    pub(crate) fn toggle(&mut self, x: usize, y: usize) -> bool {
        let (x, y) = (x % WIDTH, y % HEIGHT);
        let row = self.0[y * ROW_LENGTH..(y + 1) * ROW_LENGTH].view_bits_mut::<Msb0>();
        let was_lit = row[x];
        row.set(x, !was_lit);
        was_lit
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
