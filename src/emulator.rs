//! The CHIP-8 machine, its parts, and the pieces a host needs to drive it.

pub mod display;
pub mod driver;
pub mod emulator;
pub mod error;
pub mod input;
pub mod inspect;
pub mod instruction;
pub mod keypad;
pub mod memory;
pub mod output;
pub mod quirks;
pub mod timers;

pub use self::emulator::{Emulator, Status, StepOutcome};
