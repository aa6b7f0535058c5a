//! Runs the machine on behalf of a host that calls in once per 60 Hz frame.
//!
//! Instructions and timers run at independent rates: the instruction rate is
//! configurable while the timers always tick once per frame.

use crate::emulator::emulator::{Emulator, StepOutcome};
use crate::emulator::error::ExecutionError;
use crate::emulator::input::EmulatorInput;
use crate::emulator::output::EmulatorOutput;
use crate::emulator::timers::TIMER_HZ;

pub const DEFAULT_CYCLES_PER_SECOND: u32 = 700;
/// How many frames the tone keeps sounding once the sound timer runs out.
const TONE_TICKS: u32 = 25;

/// Spreads a number of cycles per second evenly over the frames of that second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleBudget {
    cycles_per_second: u32,
    remainder: u32,
}

impl CycleBudget {
    pub fn new(cycles_per_second: u32) -> CycleBudget {
        CycleBudget {
            cycles_per_second,
            remainder: 0,
        }
    }

    pub fn cycles_per_second(&self) -> u32 {
        self.cycles_per_second
    }

    /// How many cycles to run this frame. Rounding left-overs carry into the next frame.
    pub fn next_frame(&mut self) -> u32 {
        let total = self.cycles_per_second.saturating_add(self.remainder);
        self.remainder = total % TIMER_HZ;
        total / TIMER_HZ
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Ran { cycles: u32 },
    /// Nothing ran because the driver is paused.
    Paused,
    /// The program hit a breakpoint after `cycles` cycles and the driver paused itself.
    Breakpoint { cycles: u32 },
}

pub struct Driver<I: EmulatorInput, O: EmulatorOutput> {
    emulator: Emulator,
    input: I,
    output: O,
    budget: CycleBudget,
    paused: bool,
    tone_ticks: u32,
}

impl<I: EmulatorInput, O: EmulatorOutput> Driver<I, O> {

    pub fn new(emulator: Emulator, input: I, output: O, cycles_per_second: u32) -> Driver<I, O> {
        log::info!("Running at {} cycles per second", cycles_per_second);
        Driver {
            emulator,
            input,
            output,
            budget: CycleBudget::new(cycles_per_second),
            paused: false,
            tone_ticks: 0,
        }
    }

    /// Run one frame: read the keys, run this frame's cycles, tick the timers
    /// and present the screen if it changed.
    pub fn frame(&mut self) -> Result<FrameOutcome, ExecutionError> {
        if self.paused {
            return Ok(FrameOutcome::Paused);
        }

        self.emulator.set_keypad(self.input.keypad());

        let budget = self.budget.next_frame();
        let mut outcome = FrameOutcome::Ran { cycles: budget };
        for cycle in 1..=budget {
            if self.emulator.step()? == StepOutcome::Breakpoint {
                self.pause();
                outcome = FrameOutcome::Breakpoint { cycles: cycle };
                break;
            }
        }

        self.tick_timers();
        self.present();
        Ok(outcome)
    }

    fn tick_timers(&mut self) {
        if self.emulator.tick_timers().beep_started {
            self.output.set_tone(true);
            self.tone_ticks = TONE_TICKS;
        }
        if self.tone_ticks > 0 {
            self.tone_ticks -= 1;
            if self.tone_ticks == 0 {
                self.output.set_tone(false);
            }
        }
    }

    fn present(&mut self) {
        if self.emulator.framebuffer().needs_redraw() {
            self.output.draw(self.emulator.framebuffer());
            self.emulator.mark_drawn();
        }
    }

    /// Stop running frames. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        if self.paused {
            return false;
        }
        log::warn!("Paused at {:#05x}", self.emulator.program_counter());
        self.paused = true;
        true
    }

    /// Continue running frames. Returns false if not paused.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        log::warn!("Resumed at {:#05x}", self.emulator.program_counter());
        self.paused = false;
        true
    }

    pub fn toggle_pause(&mut self) {
        if !self.pause() {
            self.resume();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// Mutable access for inspection. Pause first.
    pub fn emulator_mut(&mut self) -> &mut Emulator {
        &mut self.emulator
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn budget(&self) -> &CycleBudget {
        &self.budget
    }
}
