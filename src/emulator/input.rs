use crate::emulator::keypad::Keypad;

/// Represents an input device that is capable of reporting which of the keys 0x0..=0xF are held down.
pub trait EmulatorInput {
    /// A snapshot of the keys held down right now. Called once per frame.
    fn keypad(&mut self) -> Keypad;
}

/// An input device that never provides any input
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn keypad(&mut self) -> Keypad {
        Keypad::new()
    }
}
