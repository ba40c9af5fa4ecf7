//! # Kubernetes Snapshot Diff
//!
//! Compares two snapshots of Kubernetes resources and reports which
//! resources exist on only one side and how the shared ones differ.
//!
//! A snapshot can come from a live cluster, a backup archive, a local
//! directory of manifests or a git repository. Every snapshot is reduced to
//! a [`ResourceSet`] keyed by scope, type and name, so any two of them can be
//! compared.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON resource payloads
//! - [`fieldpath`] - Paths addressing fields inside a payload
//! - [`delta`] - Structural diff of two payloads and its text rendering
//! - [`source`] - Resource keys, snapshot sets and the listers producing them
//! - [`report`] - Comparison of two sources and report output

pub mod delta;
pub mod fieldpath;
pub mod report;
pub mod source;
pub mod value;

pub use delta::{AsciiFormatter, Diff};
pub use fieldpath::{Path, PathElement};
pub use report::{generate, print_deltas, print_report_summary, Options, Report};
pub use source::{
    Includes, LabelSelector, ResourceKey, ResourceLister, ResourceSet, Scope, SourceDescriptor,
};
pub use value::Value;
