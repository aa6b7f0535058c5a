//! Small helpers that don't belong to the machine itself.

pub mod bit_splitter;
