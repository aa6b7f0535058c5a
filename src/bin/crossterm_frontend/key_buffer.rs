use crossterm::event::KeyCode;
use std::{collections::VecDeque, sync::Mutex};

/// A thread-safe buffer of key presses.
/// For use with a producer thread reading the terminal and the frame loop consuming the keys.
/// Wrap it in an `std::sync::Arc` and you are good to go.
pub struct KeyBuffer {
    buffer: Mutex<VecDeque<KeyCode>>,
}

impl KeyBuffer {
    pub fn new() -> KeyBuffer {
        KeyBuffer {
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    /// Push a new keypress to the buffer.
    pub fn push(&self, key_code: KeyCode) {
        if let Ok(mut guard) = self.buffer.lock() {
            guard.push_back(key_code);
        }
    }

    /// Take every keypress seen since the last call, oldest first.
    pub fn drain(&self) -> Vec<KeyCode> {
        match self.buffer.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}
