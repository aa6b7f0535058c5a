//! Peek and poke access for debuggers, kept off the hot path.
//!
//! Nothing here is synchronised. A host that edits state from another thread
//! must pause the step loop first, see [`crate::emulator::driver::Driver::pause`].

use crate::emulator::emulator::{Emulator, NUM_REGISTERS, STACK_SIZE};
use crate::emulator::instruction::Reg;
use std::fmt;

/// How many bytes on either side of the program counter a [`MemoryWindow`] covers.
pub const WINDOW_RADIUS: usize = 120;

/// A slice of memory around the program counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryWindow {
    /// Address of the first byte in `bytes`.
    pub start: usize,
    pub bytes: Vec<u8>,
    pub program_counter: u16,
}

impl MemoryWindow {
    /// Pair up the bytes into instruction words, starting at `start`.
    /// The flag is set on the word the program counter points at.
    pub fn words(&self) -> impl Iterator<Item = (usize, u16, bool)> + '_ {
        self.bytes.chunks_exact(2).enumerate().map(move |(n, pair)| {
            let addr = self.start + 2 * n;
            let word = ((pair[0] as u16) << 8) | pair[1] as u16;
            (addr, word, addr == self.program_counter as usize)
        })
    }
}

impl fmt::Display for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, (addr, word, current)) in self.words().enumerate() {
            if n > 0 {
                f.write_str(if n % 8 == 0 { "\n" } else { " " })?;
            }
            if current {
                write!(f, "[{:03x}:{:04x}]", addr, word)?;
            } else {
                write!(f, " {:03x}:{:04x} ", addr, word)?;
            }
        }
        Ok(())
    }
}

impl Emulator {
    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    /// Registers outside V0..=VF are ignored.
    pub fn set_register(&mut self, Reg(x): Reg, value: u8) {
        if let Some(register) = self.registers.get_mut(x as usize) {
            *register = value;
        }
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn set_index(&mut self, value: u16) {
        self.i = value;
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn set_program_counter(&mut self, value: u16) {
        self.program_counter = value;
    }

    /// The active return addresses, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.stack_pointer as usize]
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    /// Returns false and leaves the stack pointer alone if `value` is past the end of the stack.
    pub fn set_stack_pointer(&mut self, value: u8) -> bool {
        if value as usize > STACK_SIZE {
            return false;
        }
        self.stack_pointer = value;
        true
    }

    /// Overwrite any of the 16 slots, active or not. Returns false for slots past the end.
    pub fn set_stack_slot(&mut self, slot: usize, addr: u16) -> bool {
        match self.stack.get_mut(slot) {
            Some(entry) => {
                *entry = addr;
                true
            }
            None => false,
        }
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.timers.delay = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.timers.sound = value;
    }

    /// Memory from 120 bytes before the program counter to 121 bytes after it.
    pub fn memory_window(&self) -> MemoryWindow {
        let pc = self.program_counter as usize;
        let start = pc.saturating_sub(WINDOW_RADIUS);
        let bytes = self.memory.window(start..pc + WINDOW_RADIUS + 2).to_vec();
        MemoryWindow {
            start,
            bytes,
            program_counter: self.program_counter,
        }
    }
}

/// A summary of the CPU state, one line per part.
impl fmt::Display for Emulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "I: {:#05x}  PC: {:#05x}  status: {:?}", self.i, self.program_counter, self.status)?;

        write!(f, "Stack:")?;
        for (n, addr) in self.stack.iter().enumerate() {
            if n == self.stack_pointer as usize {
                write!(f, " <{:03x}>", addr)?;
            } else {
                write!(f, " {:03x}", addr)?;
            }
        }
        writeln!(f)?;

        for (n, value) in self.registers.iter().enumerate() {
            write!(f, "v{:x}={:02x} ", n, value)?;
        }
        writeln!(f)?;

        writeln!(f, "Delay: {:#04x}  Sound: {:#04x}", self.timers.delay, self.timers.sound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::memory::MEM_SIZE;
    use crate::emulator::quirks::Quirks;
    use pretty_assertions::assert_eq;

    #[test]
    fn pokes_are_visible_to_the_program() {
        let mut emulator = Emulator::with_program(&[0x8A, 0xB4], Quirks::default()).unwrap();
        emulator.set_register(Reg(0xA), 2);
        emulator.set_register(Reg(0xB), 3);
        emulator.step().unwrap();
        assert_eq!(5, emulator.registers()[0xA]);
    }

    #[test]
    fn setting_an_unknown_register_is_ignored() {
        let mut emulator = Emulator::new();
        emulator.set_register(Reg(0x10), 7);
        assert_eq!(&[0; NUM_REGISTERS], emulator.registers());
    }

    #[test]
    fn timers_index_and_pc_round_trip() {
        let mut emulator = Emulator::new();
        emulator.set_delay_timer(3);
        emulator.set_sound_timer(4);
        emulator.set_index(0x123);
        emulator.set_program_counter(0x456);
        assert_eq!(
            (3, 4, 0x123, 0x456),
            (emulator.delay_timer(), emulator.sound_timer(), emulator.index(), emulator.program_counter())
        );
    }

    #[test]
    fn stack_shows_only_active_frames() {
        let mut emulator = Emulator::with_program(&[0x22, 0x04, 0x00, 0x00, 0x22, 0x08], Quirks::default()).unwrap();
        assert!(emulator.stack().is_empty());
        emulator.step().unwrap();
        emulator.step().unwrap();
        assert_eq!(&[0x200, 0x204][..], emulator.stack());
        assert_eq!(2, emulator.stack_pointer());
    }

    #[test]
    fn stack_pokes_drive_return() {
        // 0x200: return
        let mut emulator = Emulator::with_program(&[0x00, 0xEE], Quirks::default()).unwrap();
        assert!(emulator.set_stack_slot(0, 0x300));
        assert!(emulator.set_stack_pointer(1));
        assert_eq!(&[0x300][..], emulator.stack());
        emulator.step().unwrap();
        assert_eq!(0x302, emulator.program_counter());
        assert_eq!(0, emulator.stack_pointer());
    }

    #[test]
    fn stack_pokes_past_the_end_are_rejected() {
        let mut emulator = Emulator::new();
        assert!(emulator.set_stack_pointer(STACK_SIZE as u8));
        assert!(!emulator.set_stack_pointer(STACK_SIZE as u8 + 1));
        assert_eq!(STACK_SIZE as u8, emulator.stack_pointer());
        assert!(!emulator.set_stack_slot(STACK_SIZE, 0x123));
    }

    #[test]
    fn memory_window_surrounds_the_program_counter() {
        let emulator = Emulator::with_program(&[0x12, 0x34], Quirks::default()).unwrap();
        let window = emulator.memory_window();
        assert_eq!(0x200 - WINDOW_RADIUS, window.start);
        assert_eq!(2 * WINDOW_RADIUS + 2, window.bytes.len());
        let current: Vec<_> = window.words().filter(|(_, _, current)| *current).collect();
        assert_eq!(vec![(0x200, 0x1234, true)], current);
    }

    #[test]
    fn memory_window_is_clamped_at_both_ends() {
        let mut emulator = Emulator::new();
        emulator.set_program_counter(0x10);
        assert_eq!(0, emulator.memory_window().start);
        assert_eq!(0x10 + WINDOW_RADIUS + 2, emulator.memory_window().bytes.len());

        emulator.set_program_counter(0xFFE);
        let window = emulator.memory_window();
        assert_eq!(MEM_SIZE, window.start + window.bytes.len());
    }

    #[test]
    fn summary_marks_the_stack_pointer() {
        let mut emulator = Emulator::with_program(&[0x22, 0x04], Quirks::default()).unwrap();
        emulator.step().unwrap();
        let summary = emulator.to_string();
        assert!(summary.contains("PC: 0x204"));
        assert!(summary.contains("Stack: 200 <000>"));
    }
}
