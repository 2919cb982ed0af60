//! CSV output tables.

mod write;

pub use write::*;
