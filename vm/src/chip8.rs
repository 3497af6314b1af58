use core::convert::{Infallible, TryFrom};

use heapless::{consts::U48, Vec};
use log::{debug, trace};
use nanorand::{rand::pcg64::Pcg64, RNG};

use crate::error::Error;
use crate::frame::{Frame, FrameView};
use crate::memory::{Memory, ADDRESS_MASK, FONT_GLYPH_SIZE, FONT_START, PROGRAM_START};
use crate::opcode::OpCode;
use crate::timer::{FrameTicks, Timer, TimerState};

pub const DEFAULT_CLOCK_SPEED: u32 = 700;
pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const KEY_COUNT: usize = 16;

/// Flag/carry register
const VF: usize = 0xF;

/// The CHIP-8 virtual machine
///
/// Owns every piece of machine state. The host drives it by writing the key
/// array, calling `execute_frame` once per display refresh and then polling
/// `consume_draw_flag`, `display` and `should_beep`.
pub struct Chip8 {
    v: [u8; 16],
    i: u16,
    pc: u16,
    last_fetch: u16,
    memory: Memory,
    stack: Vec<u16, U48>,
    frame: Frame,
    draw_flag: bool,
    keys: [bool; KEY_COUNT],
    delay_timer: Timer,
    sound_timer: Timer,
    frame_ticks: FrameTicks,
    clock_speed: u32,
    fps: u32,
    rng: Pcg64,
}

impl Chip8 {
    /// Fresh machine with the font loaded and an empty program area
    ///
    /// `seed` initializes the generator behind `CXNN`.
    pub fn new(seed: u128) -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            last_fetch: PROGRAM_START,
            memory: Memory::new(),
            stack: Vec::new(),
            frame: Frame::new(),
            draw_flag: false,
            keys: [false; KEY_COUNT],
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            frame_ticks: FrameTicks::new(DEFAULT_FRAME_RATE),
            clock_speed: DEFAULT_CLOCK_SPEED,
            fps: DEFAULT_FRAME_RATE,
            rng: Pcg64::new_seed(seed),
        }
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    pub fn load_program(&mut self, prog: &[u8]) -> Result<(), Error> {
        self.memory.load(prog)
    }

    /// Frames per second the host calls `execute_frame` at
    pub fn set_frame_rate(&mut self, fps: u32) -> Result<(), Error> {
        if fps == 0 {
            return Err(Error::Configuration("frame rate must be positive"));
        }
        debug!("frame rate set to {}", fps);
        self.fps = fps;
        self.frame_ticks = FrameTicks::new(fps);
        Ok(())
    }

    /// Instructions executed per second of emulated time
    pub fn set_clock_speed(&mut self, clock_speed: u32) -> Result<(), Error> {
        if clock_speed == 0 {
            return Err(Error::Configuration("clock speed must be positive"));
        }
        debug!("clock speed set to {}", clock_speed);
        self.clock_speed = clock_speed;
        Ok(())
    }

    pub fn frame_rate(&self) -> u32 {
        self.fps
    }

    pub fn clock_speed(&self) -> u32 {
        self.clock_speed
    }

    /// Instruction budget of a single frame, the remainder of the division is dropped
    pub fn cycles_per_frame(&self) -> u32 {
        self.clock_speed / self.fps
    }

    /// Run one frame worth of instructions, then advance the timers once
    ///
    /// The first error aborts the frame, timers are not advanced in that case.
    pub fn execute_frame(&mut self) -> Result<(), Error> {
        for _ in 0..self.cycles_per_frame() {
            self.execute_cycle()?;
        }
        self.tick_timers();
        Ok(())
    }

    /// Fetch, decode and execute a single instruction
    pub fn execute_cycle(&mut self) -> Result<(), Error> {
        let addr = self.pc;
        self.last_fetch = addr;
        let raw = self.memory.read_word(addr);
        self.pc_increment();
        let opcode = OpCode::try_from(raw)?;
        trace!("{:#05x}: {:04X} {:?}", addr, raw, opcode);
        self.execute(opcode)
    }

    /// Returns true once after each display change
    pub fn consume_draw_flag(&mut self) -> bool {
        core::mem::replace(&mut self.draw_flag, false)
    }

    /// Live view of the display
    pub fn display(&self) -> FrameView<'_> {
        self.frame.view()
    }

    /// Tone should be playing while any of the sound timer is left
    pub fn should_beep(&self) -> bool {
        self.sound_timer.is_active()
    }

    /// Key states, index is the CHIP-8 key value
    pub fn keys_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        &mut self.keys
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    /// Set a single key, values above 0xF are ignored
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        if let Some(state) = self.keys.get_mut(key as usize) {
            *state = pressed;
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Address of the most recently fetched instruction, the one that failed
    /// when `execute_cycle` returns an error
    pub fn last_fetch(&self) -> u16 {
        self.last_fetch
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self, x: u8) -> u8 {
        self.v[(x & 0xF) as usize]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_raw()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.load()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.load()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn tick_timers(&mut self) {
        let ticks = self.frame_ticks.advance();
        self.delay_timer.decrement(ticks);
        if self.sound_timer.decrement(ticks) == TimerState::Finished {
            debug!("sound timer expired");
        }
    }

    #[inline]
    fn pc_increment(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDRESS_MASK;
    }

    /// Lowest-indexed key held down, `WouldBlock` while none is
    fn pressed_key(&self) -> nb::Result<u8, Infallible> {
        self.keys
            .iter()
            .position(|&pressed| pressed)
            .map(|key| key as u8)
            .ok_or(nb::Error::WouldBlock)
    }

    fn is_key_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }
}

// OpCodes impls
//
// Handlers of the 8XY_ group write VF before the result. When VF is itself an
// operand the later read sees the new flag, and when VF is the destination the
// result overwrites the flag.
impl Chip8 {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> Result<(), Error> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_1NNN { nnn }     => self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) -> Result<(), Error> {
        self.frame.clear();
        self.draw_flag = true;
        Ok(())
    }

    /// Return from a subroutine
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .ok_or(Error::StackUnderflow)
            .map(|addr| self.pc = addr)
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        self.stack
            .push(self.pc)
            .map_err(|_| Error::StackOverflow)
            .map(|_| self.pc = nnn)
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] == nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] != nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = nn;
        Ok(())
    }

    /// Add the value NN to register VX
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] |= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] &= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] ^= self.v[y as usize];
        Ok(())
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let (value, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[VF] = carry as u8;
        self.v[x as usize] = value;
        Ok(())
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[VF] = (self.v[x as usize] >= self.v[y as usize]) as u8;
        self.v[x as usize] = self.v[x as usize].wrapping_sub(self.v[y as usize]);
        Ok(())
    }

    /// Shift VX right in place, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<(), Error> {
        self.v[VF] = self.v[x as usize] & 1u8;
        self.v[x as usize] >>= 1;
        Ok(())
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[VF] = (self.v[y as usize] >= self.v[x as usize]) as u8;
        self.v[x as usize] = self.v[y as usize].wrapping_sub(self.v[x as usize]);
        Ok(())
    }

    /// Shift VX left in place, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<(), Error> {
        self.v[VF] = self.v[x as usize] >> 7;
        self.v[x as usize] <<= 1;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<(), Error> {
        self.i = nnn;
        Ok(())
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = (nnn + self.v[0] as u16) & ADDRESS_MASK;
        Ok(())
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.rng.generate::<u8>() & nn;
        Ok(())
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 },
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<(), Error> {
        let origin_x = self.v[x as usize] as usize;
        let origin_y = self.v[y as usize] as usize;
        self.v[VF] = 0;
        for row in 0..n as u16 {
            let sprite = self.memory.read(self.i.wrapping_add(row));
            for col in 0..8usize {
                if sprite & (0x80u8 >> col) != 0
                    && self.frame.toggle(origin_x + col, origin_y + row as usize)
                {
                    self.v[VF] = 1;
                }
            }
        }
        self.draw_flag = true;
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if self.is_key_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if !self.is_key_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<(), Error> {
        self.v[x as usize] = self.delay_timer.load();
        Ok(())
    }

    /// Wait for a keypress and store the result in register VX
    /// FX0A { x: u8 },
    ///
    /// Does not block the host, with no key held the pc is moved back so the
    /// same instruction runs again on the next cycle.
    fn assign_vx_wait_for_key(&mut self, x: u8) -> Result<(), Error> {
        match self.pressed_key() {
            Ok(key) => self.v[x as usize] = key,
            Err(nb::Error::WouldBlock) => self.pc = self.pc.wrapping_sub(2) & ADDRESS_MASK,
            Err(nb::Error::Other(never)) => match never {},
        }
        Ok(())
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.delay_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.sound_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Add the value stored in register VX to register I
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = self.i.wrapping_add(self.v[x as usize] as u16);
        Ok(())
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = FONT_START + self.v[x as usize] as u16 * FONT_GLYPH_SIZE;
        Ok(())
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        self.memory.write(self.i, value / 100u8);
        self.memory.write(self.i.wrapping_add(1), (value % 100) / 10u8);
        self.memory.write(self.i.wrapping_add(2), value % 10u8);
        Ok(())
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x {
            self.memory
                .write(self.i.wrapping_add(idx as u16), self.v[idx as usize]);
        }
        Ok(())
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x {
            self.v[idx as usize] = self.memory.read(self.i.wrapping_add(idx as u16));
        }
        Ok(())
    }
}
