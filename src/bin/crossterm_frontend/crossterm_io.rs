use chip_fa::emulator::display::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use chip_fa::emulator::keypad::{Keypad, NUM_KEYS};
use chip_fa::emulator::{input::EmulatorInput, output::EmulatorOutput};

use crossterm::event::KeyCode;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::io::{stdout, Stdout, Write};
use std::time::{Duration, Instant};

/// Terminals only report presses, so a key counts as held for this long after its last press.
const HOLD_TIMEOUT: Duration = Duration::from_millis(250);

/// The keypad laid out on the left of a QWERTY keyboard, in keypad order 0x0..=0xF.
const LAYOUT: [char; NUM_KEYS] = [
    '1', '2', '3', '4',
    'q', 'w', 'e', 'r',
    'a', 's', 'd', 'f',
    'z', 'x', 'c', 'v',
];

pub struct CrosstermInput {
    last_pressed: [Option<Instant>; NUM_KEYS],
}

impl CrosstermInput {
    pub fn new() -> CrosstermInput {
        CrosstermInput {
            last_pressed: [None; NUM_KEYS],
        }
    }

    /// Record a key press. Returns false if the key isn't part of the keypad.
    pub fn press(&mut self, key: KeyCode) -> bool {
        match key_to_u8(key) {
            Some(index) => {
                self.last_pressed[index as usize] = Some(Instant::now());
                true
            }
            None => false,
        }
    }
}

impl EmulatorInput for CrosstermInput {
    fn keypad(&mut self) -> Keypad {
        let mut keypad = Keypad::new();
        for (index, pressed) in self.last_pressed.iter().enumerate() {
            if pressed.map_or(false, |at| at.elapsed() < HOLD_TIMEOUT) {
                keypad.press(index as u8);
            }
        }
        keypad
    }
}

pub struct CrosstermOutput {
    stdout: Stdout,
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        terminal::enable_raw_mode()?;

        // Frame the screen, two characters per pixel
        let bottom = SCREEN_HEIGHT as u16 + 1;
        let right = 2 * SCREEN_WIDTH as u16 + 1;
        let horizontal = "━".repeat(2 * SCREEN_WIDTH);
        queue!(stdout, cursor::MoveTo(0, 0), Print(format!("┏{}┓", horizontal)))?;
        for y in 1..bottom {
            queue!(stdout, cursor::MoveTo(0, y), Print('┃'), cursor::MoveTo(right, y), Print('┃'))?;
        }
        queue!(stdout, cursor::MoveTo(0, bottom), Print(format!("┗{}┛", horizontal)))?;
        stdout.flush()?;

        Ok(CrosstermOutput { stdout })
    }

    /// Write some lines of text below the screen, replacing what was there.
    pub fn show_status(&mut self, text: &str) {
        if let Err(error) = self.write_status(text) {
            log::warn!("Unable to write status: {}", error);
        }
    }

    fn write_status(&mut self, text: &str) -> crossterm::Result<()> {
        let top = SCREEN_HEIGHT as u16 + 2;
        queue!(self.stdout, cursor::MoveTo(0, top), Clear(ClearType::FromCursorDown))?;
        for (n, line) in text.lines().enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, top + n as u16), Print(line))?;
        }
        self.stdout.flush()?;
        Ok(())
    }

    fn write_frame(&mut self, framebuffer: &Framebuffer) -> crossterm::Result<()> {
        for (y, row) in framebuffer.rows().iter().enumerate() {
            let line: String = row.iter().map(|c| if *c == 1 { "██" } else { "  " }).collect();
            queue!(self.stdout, cursor::MoveTo(1, y as u16 + 1), Print(line))?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.stdout, LeaveAlternateScreen, cursor::Show);
    }
}

impl EmulatorOutput for CrosstermOutput {
    fn draw(&mut self, framebuffer: &Framebuffer) {
        if let Err(error) = self.write_frame(framebuffer) {
            log::warn!("Unable to draw frame: {}", error);
        }
    }

    fn set_tone(&mut self, on: bool) {
        // The terminal bell is the closest thing to a tone we have
        if on {
            let _ = execute!(self.stdout, Print('\u{7}'));
        }
    }
}

fn key_to_u8(key: KeyCode) -> Option<u8> {
    match key {
        KeyCode::Char(c) => LAYOUT
            .iter()
            .position(|k| *k == c.to_ascii_lowercase())
            .map(|i| i as u8),
        _ => None,
    }
}
