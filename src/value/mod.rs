//! Value module - In-memory representation of resource payloads.
//!
//! Payloads are decoded from JSON, YAML or API objects into one tree type
//! so that snapshots from different sources compare field by field.

mod value;

pub use value::*;
