//! Press state of the 16 hex keys, written by the host before each cycle.

pub const NUM_KEYS: usize = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Keypad {
        Keypad::default()
    }

    pub fn from_pressed(pressed: [bool; NUM_KEYS]) -> Keypad {
        Keypad { pressed }
    }

    /// Keys outside 0x0..=0xF are never pressed.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed.get(key as usize).copied().unwrap_or(false)
    }

    pub fn press(&mut self, key: u8) {
        if let Some(state) = self.pressed.get_mut(key as usize) {
            *state = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(state) = self.pressed.get_mut(key as usize) {
            *state = false;
        }
    }

    /// The lowest pressed key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.pressed.iter().position(|p| *p).map(|i| i as u8)
    }
}
