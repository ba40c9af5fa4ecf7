//! Field path module - Locations of fields inside nested payloads.
//!
//! Paths label every change a structural diff reports.

mod path;

pub use path::*;
