//! Behaviour that differs between historical interpreters.

/// The defaults match the most common modern interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6 and 8XYE copy VY into VX before shifting, as on the COSMAC VIP.
    pub shift_uses_vy: bool,
    /// FX55 and FX65 leave I pointing just past the last byte they touched.
    pub load_store_increments_index: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            shift_uses_vy: false,
            load_store_increments_index: true,
        }
    }
}
