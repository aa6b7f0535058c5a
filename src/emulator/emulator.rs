//! The CHIP-8 virtual machine as described at https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.

use crate::emulator::display::Framebuffer;
use crate::emulator::error::{ConfigurationError, ExecutionError};
use crate::emulator::instruction::*;
use crate::emulator::keypad::Keypad;
use crate::emulator::memory::{Memory, GLYPH_SIZE, PROGRAM_START};
use crate::emulator::quirks::Quirks;
use crate::emulator::timers::{TimerTick, Timers};
use std::path::Path;

pub const NUM_REGISTERS: usize = 16;
pub const STACK_SIZE: usize = 16;
const FLAG: usize = 0xF;

/// What the machine is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Stopped on FX0A until a key is held down. The key goes into the register.
    AwaitingKey(Reg),
    /// A fatal error occurred. Nothing more will be executed.
    Halted,
}

/// The result of a single successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction),
    /// No key was pressed, so the program counter did not move.
    AwaitingKey,
    /// The program asked the host to pause and allow inspection.
    Breakpoint,
}

pub struct Emulator {
    pub(super) memory: Memory,
    pub(super) registers: [u8; NUM_REGISTERS],
    pub(super) timers: Timers,
    pub(super) i: u16,
    pub(super) program_counter: u16,
    pub(super) stack_pointer: u8,
    pub(super) stack: [u16; STACK_SIZE],
    pub(super) framebuffer: Framebuffer,
    pub(super) keypad: Keypad,
    pub(super) status: Status,
    quirks: Quirks,
}

impl Emulator {

    /// Boot a new machine with the font loaded and the program counter at 0x200.
    pub fn new() -> Emulator {
        Emulator::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Emulator {
        log::info!("Booting with {:?}", quirks);
        Emulator {
            memory: Memory::new(),
            registers: [0; NUM_REGISTERS],
            timers: Timers::default(),
            i: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            stack: [0; STACK_SIZE],
            framebuffer: Framebuffer::new(),
            keypad: Keypad::new(),
            status: Status::Running,
            quirks,
        }
    }

    /// Boot a machine and load `program` into it.
    pub fn with_program(program: &[u8], quirks: Quirks) -> Result<Emulator, ConfigurationError> {
        let mut emulator = Emulator::with_quirks(quirks);
        emulator.load(program)?;
        Ok(emulator)
    }

    /// Boot a machine and load the ROM stored at `path` into it.
    pub fn from_file<P: AsRef<Path>>(path: P, quirks: Quirks) -> Result<Emulator, ConfigurationError> {
        let program = std::fs::read(path)?;
        Emulator::with_program(&program, quirks)
    }

    /// Return to the freshly booted state, discarding memory and any loaded program.
    pub fn reset(&mut self) {
        log::debug!("Resetting machine");
        *self = Emulator::with_quirks(self.quirks);
    }

    /// Copy a program into memory at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<(), ConfigurationError> {
        self.memory.load_rom(program)
    }

    /// Perform a single fetch-decode-execute cycle.
    ///
    /// Timers are not touched here, see [`Emulator::tick_timers`].
    /// Any error halts the machine for good.
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        let result = match self.status {
            Status::Halted => return Err(ExecutionError::Halted),
            Status::AwaitingKey(reg) => Ok(self.await_key(reg)),
            Status::Running => self.fetch_and_execute(),
        };

        if let Err(error) = &result {
            log::error!("Halting at {:#05x}: {}", self.program_counter, error);
            self.status = Status::Halted;
        }

        result
    }

    fn fetch_and_execute(&mut self) -> Result<StepOutcome, ExecutionError> {
        let opcode = self.memory.fetch(self.program_counter)?;
        let instruction = Instruction::from_u16(opcode)?;
        log::trace!("{:#05x}: {:04x} {:?}", self.program_counter, opcode, instruction);
        self.execute_single(instruction)
    }

    fn await_key(&mut self, Reg(x): Reg) -> StepOutcome {
        match self.keypad.first_pressed() {
            Some(key) => {
                self.registers[x as usize] = key;
                self.program_counter += 2;
                self.status = Status::Running;
                StepOutcome::Executed(Instruction::SetRegToGetKey(Reg(x)))
            }
            None => StepOutcome::AwaitingKey,
        }
    }

    /// Execute a single instruction as if it had been fetched from the program counter.
    pub fn execute_single(&mut self, instruction: Instruction) -> Result<StepOutcome, ExecutionError> {
        let mut outcome = StepOutcome::Executed(instruction);

        match instruction {

            // Advance and let the host pause.
            Instruction::Breakpoint => {
                log::warn!("Breakpoint at {:#05x}", self.program_counter);
                outcome = StepOutcome::Breakpoint;
            }

            Instruction::ClearScreen => self.framebuffer.clear(),

            // Return to the call site stored on the stack, then move past it.
            Instruction::Return => {
                if self.stack_pointer == 0 {
                    return Err(ExecutionError::StackUnderflow { pc: self.program_counter });
                }
                self.stack_pointer -= 1;
                self.program_counter = self.stack[self.stack_pointer as usize] + 2;
            }

            Instruction::Goto(Addr(addr)) => {
                self.program_counter = addr;
            }

            // Store the address of the call itself on the stack, then jump to the specified address
            Instruction::Call(Addr(addr)) => {
                if self.stack_pointer as usize >= STACK_SIZE {
                    return Err(ExecutionError::StackOverflow { pc: self.program_counter });
                }
                self.stack[self.stack_pointer as usize] = self.program_counter;
                self.stack_pointer += 1;
                self.program_counter = addr;
            }

            // If the register equals the constant, skip the next instruction
            Instruction::IfRegEqConst(Reg(x), Const(n)) => {
                if self.registers[x as usize] == n {
                    self.program_counter += 2;
                }
            }

            Instruction::IfRegNeqConst(Reg(x), Const(n)) => {
                if self.registers[x as usize] != n {
                    self.program_counter += 2;
                }
            }

            Instruction::IfRegEqReg(Reg(x), Reg(y)) => {
                if self.registers[x as usize] == self.registers[y as usize] {
                    self.program_counter += 2;
                }
            }

            Instruction::SetRegToConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = n;
            }

            // Wraps around, and leaves VF alone
            Instruction::IncRegByConst(Reg(x), Const(n)) => {
                self.registers[x as usize] = self.registers[x as usize].wrapping_add(n);
            }

            Instruction::SetRegToReg(Reg(x), Reg(y)) => {
                self.registers[x as usize] = self.registers[y as usize];
            }

            Instruction::BitwiseOr(Reg(x), Reg(y)) => {
                self.registers[x as usize] |= self.registers[y as usize];
            }

            Instruction::BitwiseAnd(Reg(x), Reg(y)) => {
                self.registers[x as usize] &= self.registers[y as usize];
            }

            Instruction::BitwiseXor(Reg(x), Reg(y)) => {
                self.registers[x as usize] ^= self.registers[y as usize];
            }

            // VF is 1 on carry. The flag is always written last, so it wins when X is F.
            Instruction::IncRegByReg(Reg(x), Reg(y)) => {
                let (sum, carry) = self.registers[x as usize].overflowing_add(self.registers[y as usize]);
                self.registers[x as usize] = sum;
                self.registers[FLAG] = carry as u8;
            }

            // VF is 0 on borrow
            Instruction::DecRegByReg(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[x as usize] = vx.wrapping_sub(vy);
                self.registers[FLAG] = (vx >= vy) as u8;
            }

            Instruction::BitshiftRight(Reg(x), Reg(y)) => {
                let value = self.shift_source(x, y);
                self.registers[x as usize] = value >> 1;
                self.registers[FLAG] = value & 1;
            }

            // VF is 0 on borrow
            Instruction::SetVxVyMinusVx(Reg(x), Reg(y)) => {
                let (vx, vy) = (self.registers[x as usize], self.registers[y as usize]);
                self.registers[x as usize] = vy.wrapping_sub(vx);
                self.registers[FLAG] = (vx <= vy) as u8;
            }

            Instruction::BitshiftLeft(Reg(x), Reg(y)) => {
                let value = self.shift_source(x, y);
                self.registers[x as usize] = value << 1;
                self.registers[FLAG] = value >> 7;
            }

            Instruction::IfRegNeqReg(Reg(x), Reg(y)) => {
                if self.registers[x as usize] != self.registers[y as usize] {
                    self.program_counter += 2;
                }
            }

            Instruction::SetI(Addr(addr)) => {
                self.i = addr;
            }

            Instruction::SetPcToV0PlusAddr(Addr(addr)) => {
                self.program_counter = self.registers[0] as u16 + addr;
            }

            Instruction::SetVxRand(Reg(x), Const(n)) => {
                self.registers[x as usize] = rand::random::<u8>() & n;
            }

            // XOR a sprite of `sprite_height` rows read from I onto the screen. VF is the collision flag.
            Instruction::Draw(Reg(x), Reg(y), Const(sprite_height)) => {
                let x_coord = self.registers[x as usize];
                let y_coord = self.registers[y as usize];
                let sprite = self.memory.slice(self.i as usize, sprite_height as usize)?;
                let any_collisions = self.framebuffer.draw_sprite(x_coord, y_coord, sprite);
                self.registers[FLAG] = any_collisions as u8;
            }

            Instruction::IfKeyEqVx(Reg(x)) => {
                if self.keypad.is_pressed(self.registers[x as usize]) {
                    self.program_counter += 2;
                }
            }

            Instruction::IfKeyNeqVx(Reg(x)) => {
                if !self.keypad.is_pressed(self.registers[x as usize]) {
                    self.program_counter += 2;
                }
            }

            Instruction::SetRegToDelayTimer(Reg(x)) => {
                self.registers[x as usize] = self.timers.delay;
            }

            // Wait for a key press without blocking the host
            Instruction::SetRegToGetKey(reg) => {
                self.status = Status::AwaitingKey(reg);
                return Ok(self.await_key(reg));
            }

            Instruction::SetDelayTimerToReg(Reg(x)) => {
                self.timers.delay = self.registers[x as usize];
            }

            Instruction::SetSoundTimerToReg(Reg(x)) => {
                self.timers.sound = self.registers[x as usize];
            }

            // VF is 1 when I leaves the 12-bit address space
            Instruction::AddRegToI(Reg(x)) => {
                let sum = self.i.wrapping_add(self.registers[x as usize] as u16);
                self.i = sum;
                self.registers[FLAG] = (sum > 0xFFF) as u8;
            }

            // Set i to character address. Each font element is 5 bytes wide.
            Instruction::SetIToSpriteAddrVx(Reg(x)) => {
                self.i = GLYPH_SIZE * self.registers[x as usize] as u16;
            }

            Instruction::SetIToBcdOfReg(Reg(x)) => {
                let value = self.registers[x as usize];
                let digits = self.memory.slice_mut(self.i as usize, 3)?;
                digits[0] = value / 100;
                digits[1] = value / 10 % 10;
                digits[2] = value % 10;
            }

            // Dump register values up to Vx
            Instruction::RegDump(Reg(x)) => {
                let count = x as usize + 1;
                self.memory
                    .slice_mut(self.i as usize, count)?
                    .copy_from_slice(&self.registers[..count]);
                self.advance_index_past(count);
            }

            // Load register values up to Vx
            Instruction::RegLoad(Reg(x)) => {
                let count = x as usize + 1;
                let values = self.memory.slice(self.i as usize, count)?;
                self.registers[..count].copy_from_slice(values);
                self.advance_index_past(count);
            }
        };

        if !instruction.is_control_flow() {
            self.program_counter += 2;
        }

        Ok(outcome)
    }

    /// Execute several instructions in order, stopping at the first error.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> Result<(), ExecutionError> {
        for instruction in instructions {
            self.execute_single(*instruction)?;
        }
        Ok(())
    }

    fn shift_source(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_uses_vy {
            self.registers[y as usize]
        } else {
            self.registers[x as usize]
        }
    }

    fn advance_index_past(&mut self, count: usize) {
        if self.quirks.load_store_increments_index {
            self.i = self.i.wrapping_add(count as u16);
        }
    }

    /// Decrement both timers. The host calls this at 60 Hz.
    pub fn tick_timers(&mut self) -> TimerTick {
        self.timers.tick()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Called by the host once it has presented the framebuffer.
    pub fn mark_drawn(&mut self) {
        self.framebuffer.mark_drawn();
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// Replace the key state the next cycles will see.
    pub fn set_keypad(&mut self, keypad: Keypad) {
        self.keypad = keypad;
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::emulator::memory::MAX_ROM_SIZE;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    fn with_program(program: &[u8]) -> Emulator {
        Emulator::with_program(program, Quirks::default()).unwrap()
    }

    fn run(emulator: &mut Emulator, instruction: Instruction) {
        emulator.execute_single(instruction).unwrap();
    }

    #[test]
    fn boots_with_font_and_program_counter() {
        let emulator = Emulator::new();
        assert_eq!(0x200, emulator.program_counter);
        assert_eq!(0xF0, emulator.memory.read(0).unwrap());
        assert_eq!([0; NUM_REGISTERS], emulator.registers);
        assert_eq!(Status::Running, emulator.status());
    }

    #[test]
    fn load_then_step_end_to_end() {
        let mut emulator = with_program(&[0x60, 0x05, 0x00, 0xE0]);
        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_eq!(5, emulator.registers[0]);
        assert!(emulator.framebuffer().rows().iter().all(|row| row.iter().all(|c| *c == 0)));
        assert!(emulator.framebuffer().needs_redraw());
        assert_eq!(0x204, emulator.program_counter);
    }

    #[test]
    fn oversized_rom_never_boots() {
        let rom = vec![0; MAX_ROM_SIZE + 1];
        assert!(Emulator::with_program(&rom, Quirks::default()).is_err());
    }

    #[test]
    fn rom_running_past_0xea0_is_rejected() {
        match Emulator::with_program(&vec![0xAB; 3233], Quirks::default()) {
            Err(ConfigurationError::RomTooLarge { size, max }) => {
                assert_eq!(3233, size);
                assert_eq!(3232, max);
            }
            Err(other) => panic!("expected RomTooLarge, got {:?}", other),
            Ok(_) => panic!("expected RomTooLarge, got a booted machine"),
        }
    }

    #[test]
    fn missing_rom_file_is_unreadable() {
        match Emulator::from_file("/definitely/not/a/rom.ch8", Quirks::default()) {
            Err(ConfigurationError::Unreadable(_)) => {}
            other => panic!("expected Unreadable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn goto_goes_to() {
        let mut emulator = Emulator::new();
        run(&mut emulator, Instruction::Goto(Addr(0x250)));
        assert_eq!(emulator.program_counter, 0x250);
    }

    #[test]
    fn return_after_call_is_neutral() {
        let program = [
            0x22, 0x06, // 0x200, call 0x206
            0x00, 0x00, // 0x202
            0x00, 0x00, // 0x204
            0x00, 0xEE  // 0x206, return
        ];
        let mut emulator = with_program(&program);

        emulator.step().unwrap(); // Call 0x206
        assert_eq!(emulator.program_counter, 0x206);
        assert_eq!(emulator.stack_pointer, 1);
        assert_eq!(emulator.stack[0], 0x200);
        emulator.step().unwrap(); // Return to 0x202
        assert_eq!(emulator.program_counter, 0x202);
        assert_eq!(emulator.stack_pointer, 0);
    }

    #[test]
    fn return_on_empty_stack_halts() {
        let mut emulator = with_program(&[0x00, 0xEE]);
        assert_eq!(Err(ExecutionError::StackUnderflow { pc: 0x200 }), emulator.step());
        assert_eq!(Status::Halted, emulator.status());
        assert_eq!(Err(ExecutionError::Halted), emulator.step());
    }

    #[test]
    fn seventeenth_nested_call_overflows() {
        // Calls itself forever
        let mut emulator = with_program(&[0x22, 0x00]);
        for _ in 0..STACK_SIZE {
            emulator.step().unwrap();
        }
        assert_eq!(STACK_SIZE as u8, emulator.stack_pointer);
        assert_eq!(Err(ExecutionError::StackOverflow { pc: 0x200 }), emulator.step());
    }

    #[test]
    fn unknown_opcode_halts() {
        let mut emulator = with_program(&[0xFF, 0xFF]);
        assert_eq!(Err(ExecutionError::UnknownOpcode(0xFFFF)), emulator.step());
        assert_eq!(0x200, emulator.program_counter);
        assert_eq!(Status::Halted, emulator.status());
    }

    #[test]
    fn running_off_the_end_of_memory_halts() {
        let mut emulator = Emulator::new();
        emulator.program_counter = 0xFFF;
        assert_eq!(Err(ExecutionError::ProgramCounterOutOfRange(0xFFF)), emulator.step());
    }

    #[test]
    fn breakpoint_advances_and_reports() {
        let mut emulator = with_program(&[0x00, 0x01]);
        assert_eq!(Ok(StepOutcome::Breakpoint), emulator.step());
        assert_eq!(0x202, emulator.program_counter);
    }

    #[test_case(Instruction::ClearScreen ; "clear screen")]
    #[test_case(Instruction::IfRegEqConst(Reg(0), Const(1)) ; "skip not taken")]
    #[test_case(Instruction::SetRegToConst(Reg(3), Const(9)) ; "set register")]
    #[test_case(Instruction::IncRegByConst(Reg(3), Const(9)) ; "add const")]
    #[test_case(Instruction::SetRegToReg(Reg(1), Reg(2)) ; "copy")]
    #[test_case(Instruction::BitwiseOr(Reg(1), Reg(2)) ; "or")]
    #[test_case(Instruction::BitwiseAnd(Reg(1), Reg(2)) ; "and")]
    #[test_case(Instruction::BitwiseXor(Reg(1), Reg(2)) ; "xor")]
    #[test_case(Instruction::IncRegByReg(Reg(1), Reg(2)) ; "add")]
    #[test_case(Instruction::DecRegByReg(Reg(1), Reg(2)) ; "sub")]
    #[test_case(Instruction::BitshiftRight(Reg(1), Reg(2)) ; "shift right")]
    #[test_case(Instruction::SetVxVyMinusVx(Reg(1), Reg(2)) ; "reverse sub")]
    #[test_case(Instruction::BitshiftLeft(Reg(1), Reg(2)) ; "shift left")]
    #[test_case(Instruction::SetI(Addr(0x300)) ; "set index")]
    #[test_case(Instruction::SetVxRand(Reg(4), Const(0xFF)) ; "random")]
    #[test_case(Instruction::Draw(Reg(0), Reg(1), Const(5)) ; "draw")]
    #[test_case(Instruction::IfKeyEqVx(Reg(0)) ; "key skip not taken")]
    #[test_case(Instruction::SetRegToDelayTimer(Reg(2)) ; "read delay")]
    #[test_case(Instruction::SetDelayTimerToReg(Reg(2)) ; "set delay")]
    #[test_case(Instruction::SetSoundTimerToReg(Reg(2)) ; "set sound")]
    #[test_case(Instruction::AddRegToI(Reg(2)) ; "add to index")]
    #[test_case(Instruction::SetIToSpriteAddrVx(Reg(2)) ; "glyph")]
    #[test_case(Instruction::SetIToBcdOfReg(Reg(2)) ; "bcd")]
    #[test_case(Instruction::RegDump(Reg(2)) ; "dump")]
    #[test_case(Instruction::RegLoad(Reg(2)) ; "load")]
    fn non_control_flow_advances_by_two(instruction: Instruction) {
        let mut emulator = Emulator::new();
        emulator.i = 0x300;
        emulator.registers[0] = 0;
        emulator.registers[2] = 7;
        run(&mut emulator, instruction);
        assert_eq!(0x202, emulator.program_counter);
    }

    #[test_case(Instruction::IfRegEqConst(Reg(0), Const(7)) ; "equal to const")]
    #[test_case(Instruction::IfRegNeqConst(Reg(0), Const(8)) ; "not equal to const")]
    #[test_case(Instruction::IfRegEqReg(Reg(0), Reg(1)) ; "equal registers")]
    #[test_case(Instruction::IfRegNeqReg(Reg(0), Reg(2)) ; "different registers")]
    #[test_case(Instruction::IfKeyEqVx(Reg(0)) ; "key pressed")]
    #[test_case(Instruction::IfKeyNeqVx(Reg(2)) ; "key not pressed")]
    fn taken_skips_advance_by_four(instruction: Instruction) {
        let mut emulator = Emulator::new();
        emulator.registers[0] = 7;
        emulator.registers[1] = 7;
        emulator.registers[2] = 9;
        emulator.keypad_mut().press(7);
        run(&mut emulator, instruction);
        assert_eq!(0x204, emulator.program_counter);
    }

    #[test_case(0xFF, 0x01, 0x00, 1 ; "carry")]
    #[test_case(0x01, 0x01, 0x02, 0 ; "no carry")]
    #[test_case(0xFF, 0xFF, 0xFE, 1 ; "largest carry")]
    fn add_sets_carry(vx: u8, vy: u8, result: u8, flag: u8) {
        let mut emulator = Emulator::new();
        emulator.registers[1] = vx;
        emulator.registers[2] = vy;
        run(&mut emulator, Instruction::IncRegByReg(Reg(1), Reg(2)));
        assert_eq!((result, flag), (emulator.registers[1], emulator.registers[FLAG]));
    }

    #[test_case(0x01, 0x02, 0xFF, 0 ; "borrow")]
    #[test_case(0x05, 0x02, 0x03, 1 ; "no borrow")]
    #[test_case(0x05, 0x05, 0x00, 1 ; "equal operands")]
    fn sub_sets_not_borrow(vx: u8, vy: u8, result: u8, flag: u8) {
        let mut emulator = Emulator::new();
        emulator.registers[1] = vx;
        emulator.registers[2] = vy;
        run(&mut emulator, Instruction::DecRegByReg(Reg(1), Reg(2)));
        assert_eq!((result, flag), (emulator.registers[1], emulator.registers[FLAG]));
    }

    #[test_case(0x02, 0x01, 0xFF, 0 ; "borrow")]
    #[test_case(0x02, 0x05, 0x03, 1 ; "no borrow")]
    #[test_case(0x05, 0x05, 0x00, 1 ; "equal operands")]
    fn reverse_sub_sets_not_borrow(vx: u8, vy: u8, result: u8, flag: u8) {
        let mut emulator = Emulator::new();
        emulator.registers[1] = vx;
        emulator.registers[2] = vy;
        run(&mut emulator, Instruction::SetVxVyMinusVx(Reg(1), Reg(2)));
        assert_eq!((result, flag), (emulator.registers[1], emulator.registers[FLAG]));
    }

    #[test]
    fn shifts_keep_the_bit_shifted_out() {
        let mut emulator = Emulator::new();
        emulator.registers[1] = 0b1000_0011;
        run(&mut emulator, Instruction::BitshiftRight(Reg(1), Reg(2)));
        assert_eq!((0b0100_0001, 1), (emulator.registers[1], emulator.registers[FLAG]));

        emulator.registers[1] = 0b1000_0011;
        run(&mut emulator, Instruction::BitshiftLeft(Reg(1), Reg(2)));
        assert_eq!((0b0000_0110, 1), (emulator.registers[1], emulator.registers[FLAG]));

        emulator.registers[1] = 0b0100_0010;
        run(&mut emulator, Instruction::BitshiftLeft(Reg(1), Reg(2)));
        assert_eq!((0b1000_0100, 0), (emulator.registers[1], emulator.registers[FLAG]));
    }

    #[test]
    fn shift_quirk_reads_vy() {
        let mut emulator = Emulator::with_quirks(Quirks { shift_uses_vy: true, ..Quirks::default() });
        emulator.registers[1] = 0xFF;
        emulator.registers[2] = 0b0000_0100;
        run(&mut emulator, Instruction::BitshiftRight(Reg(1), Reg(2)));
        assert_eq!((0b0000_0010, 0), (emulator.registers[1], emulator.registers[FLAG]));
    }

    #[test]
    fn flag_wins_when_vf_is_the_destination() {
        let mut emulator = Emulator::new();
        emulator.registers[FLAG] = 0xFF;
        emulator.registers[1] = 0x01;
        run(&mut emulator, Instruction::IncRegByReg(Reg(0xF), Reg(1)));
        assert_eq!(1, emulator.registers[FLAG]);
    }

    #[test]
    fn add_const_wraps_without_flag() {
        let mut emulator = Emulator::new();
        emulator.registers[3] = 0xFE;
        emulator.registers[FLAG] = 0x42;
        run(&mut emulator, Instruction::IncRegByConst(Reg(3), Const(3)));
        assert_eq!((0x01, 0x42), (emulator.registers[3], emulator.registers[FLAG]));
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut emulator = Emulator::new();
        emulator.registers[0] = 0x10;
        run(&mut emulator, Instruction::SetPcToV0PlusAddr(Addr(0x300)));
        assert_eq!(0x310, emulator.program_counter);
    }

    #[test]
    fn random_is_masked() {
        let mut emulator = Emulator::new();
        for _ in 0..32 {
            run(&mut emulator, Instruction::SetVxRand(Reg(5), Const(0x0F)));
            assert_eq!(0, emulator.registers[5] & 0xF0);
        }
        run(&mut emulator, Instruction::SetVxRand(Reg(5), Const(0)));
        assert_eq!(0, emulator.registers[5]);
    }

    #[test]
    fn draw_glyph_and_detect_collision() {
        let mut emulator = Emulator::new();
        emulator.registers[2] = 0xA;
        run(&mut emulator, Instruction::SetIToSpriteAddrVx(Reg(2)));
        assert_eq!(50, emulator.i);
        run(&mut emulator, Instruction::Draw(Reg(0), Reg(1), Const(5)));
        assert_eq!(0, emulator.registers[FLAG]);
        assert_eq!(1, emulator.framebuffer().get(0, 0));
        assert_eq!(0, emulator.framebuffer().get(4, 0));
        run(&mut emulator, Instruction::Draw(Reg(0), Reg(1), Const(5)));
        assert_eq!(1, emulator.registers[FLAG]);
        assert_eq!(0, emulator.framebuffer().get(0, 0));
    }

    #[test]
    fn draw_past_the_end_of_memory_halts() {
        let mut emulator = with_program(&[0xD0, 0x15]);
        emulator.i = 0xFFE;
        assert_eq!(Err(ExecutionError::AddressOutOfBounds(0x1002)), emulator.step());
    }

    #[test]
    fn bcd_writes_three_digits() {
        let mut emulator = Emulator::new();
        emulator.i = 0x300;
        emulator.registers[4] = 254;
        run(&mut emulator, Instruction::SetIToBcdOfReg(Reg(4)));
        assert_eq!(&[2, 5, 4][..], emulator.memory.slice(0x300, 3).unwrap());
        assert_eq!(0x300, emulator.i);
    }

    #[test]
    fn add_to_index_flags_overflow_past_12_bits() {
        let mut emulator = Emulator::new();
        emulator.i = 0xFFE;
        emulator.registers[1] = 1;
        run(&mut emulator, Instruction::AddRegToI(Reg(1)));
        assert_eq!((0xFFF, 0), (emulator.i, emulator.registers[FLAG]));
        run(&mut emulator, Instruction::AddRegToI(Reg(1)));
        assert_eq!((0x1000, 1), (emulator.i, emulator.registers[FLAG]));
    }

    #[test]
    fn timers_are_written_and_read() {
        let mut emulator = Emulator::new();
        emulator.registers[1] = 30;
        run(&mut emulator, Instruction::SetDelayTimerToReg(Reg(1)));
        run(&mut emulator, Instruction::SetSoundTimerToReg(Reg(1)));
        emulator.tick_timers();
        run(&mut emulator, Instruction::SetRegToDelayTimer(Reg(2)));
        assert_eq!(29, emulator.registers[2]);
        assert_eq!(29, emulator.timers.sound);
    }

    #[test]
    fn stepping_does_not_touch_timers() {
        let mut emulator = with_program(&[0x60, 0x01, 0x60, 0x02]);
        emulator.timers.delay = 10;
        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_eq!(10, emulator.timers.delay);
    }

    #[test]
    fn await_key_holds_until_pressed() {
        let mut emulator = with_program(&[0xF3, 0x0A]);
        assert_eq!(Ok(StepOutcome::AwaitingKey), emulator.step());
        assert_eq!(Status::AwaitingKey(Reg(3)), emulator.status());
        assert_eq!(0x200, emulator.program_counter);
        assert_eq!(Ok(StepOutcome::AwaitingKey), emulator.step());
        assert_eq!(0x200, emulator.program_counter);

        emulator.keypad_mut().press(0xB);
        emulator.keypad_mut().press(0xD);
        assert_eq!(Ok(StepOutcome::Executed(Instruction::SetRegToGetKey(Reg(3)))), emulator.step());
        assert_eq!(0xB, emulator.registers[3]);
        assert_eq!(0x202, emulator.program_counter);
        assert_eq!(Status::Running, emulator.status());
    }

    #[test]
    fn await_key_with_key_already_held_is_immediate() {
        let mut emulator = with_program(&[0xF3, 0x0A]);
        emulator.keypad_mut().press(0x4);
        emulator.step().unwrap();
        assert_eq!((0x4, 0x202), (emulator.registers[3], emulator.program_counter));
    }

    #[test]
    fn reset_discards_the_program() {
        let mut emulator = with_program(&[0x60, 0x05]);
        emulator.step().unwrap();
        emulator.reset();
        assert_eq!(0x200, emulator.program_counter);
        assert_eq!(0, emulator.registers[0]);
        assert_eq!(0, emulator.memory.read(0x200).unwrap());
    }

    #[test]
    fn keep_index_quirk_leaves_i_alone() {
        let mut emulator = Emulator::with_quirks(Quirks { load_store_increments_index: false, ..Quirks::default() });
        emulator.i = 0x300;
        run(&mut emulator, Instruction::RegDump(Reg(3)));
        assert_eq!(0x300, emulator.i);
    }

    proptest! {
        #[test]
        fn dump_then_load_round_trips(registers in prop::array::uniform16(any::<u8>()), x in 0u8..16) {
            let mut emulator = Emulator::new();
            emulator.registers = registers;
            emulator.i = 0x400;
            run(&mut emulator, Instruction::RegDump(Reg(x)));
            prop_assert_eq!(0x400 + x as u16 + 1, emulator.i);

            emulator.registers = [0; NUM_REGISTERS];
            emulator.i = 0x400;
            run(&mut emulator, Instruction::RegLoad(Reg(x)));
            prop_assert_eq!(0x400 + x as u16 + 1, emulator.i);
            prop_assert_eq!(&registers[..=x as usize], &emulator.registers[..=x as usize]);
            prop_assert!(emulator.registers[x as usize + 1..].iter().all(|r| *r == 0));
        }

        #[test]
        fn add_flag_matches_widened_sum(vx in any::<u8>(), vy in any::<u8>()) {
            let mut emulator = Emulator::new();
            emulator.registers[0] = vx;
            emulator.registers[1] = vy;
            run(&mut emulator, Instruction::IncRegByReg(Reg(0), Reg(1)));
            let sum = vx as u16 + vy as u16;
            prop_assert_eq!((sum & 0xFF) as u8, emulator.registers[0]);
            prop_assert_eq!((sum > 0xFF) as u8, emulator.registers[FLAG]);
        }

        #[test]
        fn sub_flag_matches_widened_difference(vx in any::<u8>(), vy in any::<u8>()) {
            let mut emulator = Emulator::new();
            emulator.registers[0] = vx;
            emulator.registers[1] = vy;
            run(&mut emulator, Instruction::DecRegByReg(Reg(0), Reg(1)));
            let difference = vx as i16 - vy as i16;
            prop_assert_eq!(difference as u8, emulator.registers[0]);
            prop_assert_eq!((difference >= 0) as u8, emulator.registers[FLAG]);
        }

        #[test]
        fn call_then_return_restores_position(target in (0x200u16..0xFFE).prop_map(|a| a & !1)) {
            prop_assume!(target != 0x200);
            let mut emulator = Emulator::new();
            emulator.memory.write(0x200, 0x20 | (target >> 8) as u8).unwrap();
            emulator.memory.write(0x201, target as u8).unwrap();
            emulator.memory.write(target as usize, 0x00).unwrap();
            emulator.memory.write(target as usize + 1, 0xEE).unwrap();

            emulator.step().unwrap();
            prop_assert_eq!(target, emulator.program_counter);
            emulator.step().unwrap();
            prop_assert_eq!(0x202, emulator.program_counter);
            prop_assert_eq!(0, emulator.stack_pointer);
        }
    }
}
