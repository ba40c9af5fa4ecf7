//! Delta module - Structural comparison of two resource payloads.
//!
//! [`compare`] produces a [`Diff`] listing field-level additions, removals
//! and modifications; [`AsciiFormatter`] renders a diff against the payload
//! it was computed from.

mod compare;
mod formatter;

pub use compare::*;
pub use formatter::*;
