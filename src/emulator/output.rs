use crate::emulator::display::Framebuffer;

/// Represents an output device that can present the screen and sound a tone.
pub trait EmulatorOutput {
    /// Present the framebuffer. Only called when something changed.
    fn draw(&mut self, framebuffer: &Framebuffer);
    fn set_tone(&mut self, on: bool);
}

/// A simple output device that remembers what it was last told.
#[derive(Default)]
pub struct DummyOutput {
    pub frames_drawn: usize,
    pub last_frame: Option<Framebuffer>,
    pub tone: bool,
}

impl DummyOutput {
    pub fn new() -> DummyOutput {
        DummyOutput::default()
    }
}

impl EmulatorOutput for DummyOutput {
    fn draw(&mut self, framebuffer: &Framebuffer) {
        self.frames_drawn += 1;
        self.last_frame = Some(framebuffer.clone());
    }
    fn set_tone(&mut self, on: bool) {
        self.tone = on;
    }
}
