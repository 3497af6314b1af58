//! Delay and sound countdowns.
//!
//! Programs see a timer as a byte ticking down at 60 Hz. The host may run at
//! any frame rate, so the value is kept multiplied by `PRECISION` and each
//! frame removes its share of `PRECISION * 60` units per second. The remainder
//! of that division is carried between frames, so the countdown runs at
//! exactly 60 Hz over time even when the frame rate does not divide 60.

/// Fixed multiplier applied to stored timer values
pub const PRECISION: u32 = 1000;
/// Canonical CHIP-8 timer rate in Hz
pub const FREQUENCY: u32 = 60;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    On,
    Off,
    Finished,
}

/// Scaled decrement owed to the timers by each frame
///
/// After `n` frames the sum of `advance` is exactly `n * PRECISION * 60 / fps`
/// rounded down, frame rates above `PRECISION * 60` included.
#[derive(Debug)]
pub struct FrameTicks {
    fps: u32,
    carry: u32,
}

impl FrameTicks {
    /// `fps` is validated to be non-zero before it reaches here.
    pub fn new(fps: u32) -> Self {
        Self { fps, carry: 0 }
    }

    pub fn advance(&mut self) -> u32 {
        let owed = self.carry as u64 + (PRECISION * FREQUENCY) as u64;
        let fps = self.fps as u64;
        self.carry = (owed % fps) as u32;
        (owed / fps) as u32
    }
}

#[derive(Debug)]
pub struct Timer(u32);

impl Timer {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn store(&mut self, value: u8) {
        self.0 = value as u32 * PRECISION;
    }

    /// Value as observed by programs, in whole ticks
    #[inline]
    pub fn load(&self) -> u8 {
        (self.0 / PRECISION) as u8
    }

    /// True while any fraction of a tick remains
    #[inline]
    pub fn is_active(&self) -> bool {
        self.0 != 0
    }

    /// Remove `ticks` scaled units, clamping at zero
    #[inline]
    pub fn decrement(&mut self, ticks: u32) -> TimerState {
        if self.0 > 0 {
            self.0 = self.0.saturating_sub(ticks);
            if self.0 == 0 {
                TimerState::Finished
            } else {
                TimerState::On
            }
        } else {
            TimerState::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_sum(fps: u32, frames: usize) -> u64 {
        let mut ticks = FrameTicks::new(fps);
        (0..frames).map(|_| ticks.advance() as u64).sum()
    }

    #[test]
    fn ticks_at_common_rates() {
        assert_eq!(FrameTicks::new(60).advance(), 1000);
        assert_eq!(FrameTicks::new(30).advance(), 2000);
        assert_eq!(FrameTicks::new(120).advance(), 500);
        assert_eq!(FrameTicks::new(144).advance(), 416);
    }

    #[test]
    fn remainder_is_carried() {
        let mut ticks = FrameTicks::new(144);
        let first: [u32; 3] = [ticks.advance(), ticks.advance(), ticks.advance()];
        // 60000 / 144 = 416.66..
        assert_eq!(first, [416, 417, 417]);
        assert_eq!(frame_sum(144, 144), 60_000);
        assert_eq!(frame_sum(7, 7), 60_000);
        assert_eq!(frame_sum(1000, 1000), 60_000);
    }

    #[test]
    fn frame_rate_above_precision() {
        // one scaled unit every other frame
        let mut ticks = FrameTicks::new(120_000);
        assert_eq!(ticks.advance(), 0);
        assert_eq!(ticks.advance(), 1);
        assert_eq!(frame_sum(120_000, 120_000), 60_000);

        let mut ticks = FrameTicks::new(u32::MAX);
        assert_eq!(ticks.advance(), 0);
        assert_eq!(ticks.advance(), 0);
    }

    #[test]
    fn store_and_load() {
        let mut timer = Timer::new();
        assert_eq!(timer.load(), 0);
        assert!(!timer.is_active());

        timer.store(0xFF);
        assert_eq!(timer.load(), 0xFF);
        assert!(timer.is_active());
    }

    #[test]
    fn decrement_states() {
        let mut timer = Timer::new();
        assert_eq!(timer.decrement(1000), TimerState::Off);

        timer.store(2);
        assert_eq!(timer.decrement(1000), TimerState::On);
        assert_eq!(timer.load(), 1);
        assert_eq!(timer.decrement(1000), TimerState::Finished);
        assert_eq!(timer.load(), 0);
        assert_eq!(timer.decrement(1000), TimerState::Off);
    }

    #[test]
    fn decrement_clamps_at_zero() {
        let mut timer = Timer::new();
        timer.store(1);
        assert_eq!(timer.decrement(5000), TimerState::Finished);
        assert_eq!(timer.load(), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn full_countdown_at_144_fps() {
        let mut timer = Timer::new();
        let mut ticks = FrameTicks::new(144);
        timer.store(0xFF);
        // 255 ticks at 60 Hz is 4.25 s, 612 frames at 144 fps
        for _ in 0..611 {
            assert_eq!(timer.decrement(ticks.advance()), TimerState::On);
        }
        assert_eq!(timer.decrement(ticks.advance()), TimerState::Finished);
    }

    #[test]
    fn countdown_ends_above_precision_rate() {
        let mut timer = Timer::new();
        let mut ticks = FrameTicks::new(60_001);
        timer.store(1);
        for _ in 0..60_001 {
            timer.decrement(ticks.advance());
        }
        assert!(!timer.is_active());
    }

    #[test]
    fn partial_tick_reads_down() {
        let mut timer = Timer::new();
        let mut ticks = FrameTicks::new(120);
        timer.store(3);
        timer.decrement(ticks.advance());
        assert_eq!(timer.load(), 2);
        timer.decrement(ticks.advance());
        assert_eq!(timer.load(), 2);
    }
}
