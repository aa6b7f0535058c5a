//! The 64x32 monochrome framebuffer.

use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
type Screen = [[u8; SCREEN_WIDTH]; SCREEN_HEIGHT];
const EMPTY_SCREEN: Screen = [[0; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// One bit per pixel, plus a flag telling the host that something changed.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    cells: Screen,
    redraw: bool,
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            cells: EMPTY_SCREEN,
            redraw: false,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y][x]
    }

    pub fn rows(&self) -> &Screen {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells = EMPTY_SCREEN;
        self.redraw = true;
    }

    /// XOR an 8 pixel wide sprite onto the screen with its top left corner at (x, y).
    ///
    /// The starting position wraps around the screen, while the sprite itself is
    /// clipped at the right and bottom edges. Returns true if any pixel went from set to unset.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let x_coord = x as usize % SCREEN_WIDTH;
        let y_coord = y as usize % SCREEN_HEIGHT;

        let mut any_collisions = false;
        for (row_no, row) in sprite.iter().enumerate() {
            let y = y_coord + row_no;
            if y >= SCREEN_HEIGHT {
                break;
            }
            for bit in 0..8 {
                let x = x_coord + bit;
                if x >= SCREEN_WIDTH {
                    break;
                }
                let new_pixel = row >> (7 - bit) & 1;
                let old_pixel = &mut self.cells[y][x];
                if *old_pixel == 1 && new_pixel == 1 {
                    any_collisions = true;
                }
                *old_pixel ^= new_pixel;
            }
        }

        self.redraw = true;
        any_collisions
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Called by the host once it has presented the current frame.
    pub fn mark_drawn(&mut self) {
        self.redraw = false;
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            for c in row.iter() {
                write!(f, "{}", if *c == 1 { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Framebuffer (redraw: {})", self.redraw)?;
        fmt::Display::fmt(self, f)
    }
}
