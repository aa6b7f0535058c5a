//! The two ways the machine can fail.

use std::io;
use thiserror::Error;

/// Problems found before the first cycle runs. Execution never starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unable to read ROM: {0}")]
    Unreadable(#[from] io::Error),

    #[error("ROM is {size} bytes, but at most {max} bytes fit in memory")]
    RomTooLarge { size: usize, max: usize },
}

/// Problems found while running. The machine halts and cannot continue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),

    #[error("stack overflow on call at {pc:#05x}")]
    StackOverflow { pc: u16 },

    #[error("stack underflow on return at {pc:#05x}")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at {0:#06x}")]
    AddressOutOfBounds(usize),

    #[error("program counter {0:#06x} is outside of memory")]
    ProgramCounterOutOfRange(u16),

    #[error("the machine has halted after a fatal error")]
    Halted,
}
