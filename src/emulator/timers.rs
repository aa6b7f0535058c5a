//! The delay and sound counters.
//!
//! Both are decremented by the host at a fixed 60 Hz, independent of how fast
//! instructions are executed.

pub const TIMER_HZ: u32 = 60;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

/// What happened during a single timer tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// The sound timer just ran out, which is when the host should start its tone.
    pub beep_started: bool,
}

impl Timers {
    /// Decrement each counter that is not already zero.
    pub fn tick(&mut self) -> TimerTick {
        let beep_started = self.sound == 1;
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
        TimerTick { beep_started }
    }
}
