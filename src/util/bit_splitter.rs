/// Splits a 16-bit instruction word into the fields CHIP-8 opcodes are made of.
///
/// ```text
///  15    12 11     8 7      4 3      0
/// +--------+--------+--------+--------+
/// |  kind  |   x    |   y    |   n    |
/// +--------+--------+--------+--------+
///                    \______ nn _____/
///           \___________ nnn ________/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u16);

impl BitSplitter {
    pub fn from_u16(value: u16) -> BitSplitter {
        BitSplitter(value)
    }

    /// Combine two bytes big-endian, the way they are laid out in memory.
    pub fn new(left: u8, right: u8) -> BitSplitter {
        BitSplitter(((left as u16) << 8) | right as u16)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Return the two bytes as a tuple, high byte first.
    pub fn as_two_u8(&self) -> (u8, u8) {
        ((self.0 >> 8) as u8, (self.0 & 0x00FF) as u8)
    }

    /// All four nibbles, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.kind(), self.x(), self.y(), self.n())
    }

    /// Bits 12-15.
    pub fn kind(&self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    /// Bits 8-11.
    pub fn x(&self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// Bits 4-7.
    pub fn y(&self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// Bits 0-3.
    pub fn n(&self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Bits 0-7.
    pub fn nn(&self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Bits 0-11.
    pub fn nnn(&self) -> u16 {
        self.0 & 0x0FFF
    }
}
