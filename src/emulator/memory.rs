//! 4 KiB of flat, byte addressed memory with the font in its first 80 bytes.

use crate::emulator::error::{ConfigurationError, ExecutionError};
use std::ops::Range;

pub const MEM_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
/// Programs may run up to 0xEA0. The area above that is traditionally reserved.
pub const MAX_ROM_SIZE: usize = 0xEA0 - PROGRAM_START as usize;
/// Each glyph is 5 rows of 4 pixels, stored as the high nibble.
pub const GLYPH_SIZE: u16 = 5;

const FONT: [u8; 80] = [
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

pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {
    /// Zeroed memory with the font loaded.
    pub fn new() -> Memory {
        let mut bytes = [0; MEM_SIZE];
        bytes[..FONT.len()].copy_from_slice(&FONT);
        Memory { bytes }
    }

    /// Copy a program into memory at 0x200.
    pub fn load_rom(&mut self, program: &[u8]) -> Result<(), ConfigurationError> {
        if program.len() > MAX_ROM_SIZE {
            return Err(ConfigurationError::RomTooLarge {
                size: program.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.bytes[start..start + program.len()].copy_from_slice(program);
        log::debug!("Loaded {} bytes at {:#05x}", program.len(), PROGRAM_START);
        Ok(())
    }

    pub fn read(&self, addr: usize) -> Result<u8, ExecutionError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(ExecutionError::AddressOutOfBounds(addr))
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), ExecutionError> {
        let cell = self
            .bytes
            .get_mut(addr)
            .ok_or(ExecutionError::AddressOutOfBounds(addr))?;
        *cell = value;
        Ok(())
    }

    /// Borrow `len` bytes starting at `addr`, failing if any of them fall outside memory.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8], ExecutionError> {
        let end = addr + len;
        if end > MEM_SIZE {
            return Err(ExecutionError::AddressOutOfBounds(end - 1));
        }
        Ok(&self.bytes[addr..end])
    }

    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8], ExecutionError> {
        let end = addr + len;
        if end > MEM_SIZE {
            return Err(ExecutionError::AddressOutOfBounds(end - 1));
        }
        Ok(&mut self.bytes[addr..end])
    }

    /// Read the instruction word at `pc`, high byte first.
    pub fn fetch(&self, pc: u16) -> Result<u16, ExecutionError> {
        if pc as usize > MEM_SIZE - 2 {
            return Err(ExecutionError::ProgramCounterOutOfRange(pc));
        }
        let left = self.bytes[pc as usize];
        let right = self.bytes[pc as usize + 1];
        Ok(((left as u16) << 8) | right as u16)
    }

    /// The raw bytes in `range`, clamped to memory.
    pub fn window(&self, range: Range<usize>) -> &[u8] {
        let end = range.end.min(MEM_SIZE);
        let start = range.start.min(end);
        &self.bytes[start..end]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
