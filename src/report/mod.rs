//! Report module - Comparing two sources and presenting the result.

mod printer;


pub use printer::*;

use crate::source::{Includes, ItemError, LabelSelector, ResourceLister, ResourceSet, SourceError};
use std::fmt;
use thiserror::Error;
use tracing::instrument;

/// Which of the two compared sources something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Errors that abort report generation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{side} source: {source}")]
    Source {
        side: Side,
        #[source]
        source: SourceError,
    },

    #[error("{side} source: {}", AggregateDisplay(.errors))]
    Aggregate { side: Side, errors: Vec<ItemError> },
}

/// Prints every error of an aggregate, in order.
struct AggregateDisplay<'a>(&'a [ItemError]);

impl fmt::Display for AggregateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [single] => write!(f, "{}", single),
            errors => {
                write!(f, "[")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Report partitions the resources of two sources.
///
/// `both` holds the left-hand object of every resource found on both sides
/// along with the diff to its right-hand counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub left_only: ResourceSet,
    pub right_only: ResourceSet,
    pub both: ResourceSet,
}

impl Report {
    /// Builds a report from two snapshots.
    pub fn from_sets(left: &ResourceSet, right: &ResourceSet) -> Self {
        Report {
            left_only: left.except(right),
            right_only: right.except(left),
            both: left.intersect(right),
        }
    }

    /// Returns true if both sides hold the same resources with the same
    /// content.
    pub fn is_identical(&self) -> bool {
        self.left_only.is_empty()
            && self.right_only.is_empty()
            && self.both.iter().all(|(_, entry)| !entry.is_modified())
    }
}

/// Options for [`generate`].
pub struct Options {
    pub left: Box<dyn ResourceLister>,
    pub right: Box<dyn ResourceLister>,
    pub scopes: Includes,
    pub selector: LabelSelector,
}

/// Lists both sources and compares them.
///
/// A fatal error from either source aborts immediately. Any per-resource
/// error from a source also aborts, reporting every such error at once, so
/// a report is never built from a partially read source.
#[instrument(skip_all)]
pub fn generate(options: &Options) -> Result<Report, Error> {
    let left = list_side(Side::Left, options.left.as_ref(), options)?;
    let right = list_side(Side::Right, options.right.as_ref(), options)?;

    let report = Report::from_sets(&left, &right);
    tracing::info!(
        left_only = report.left_only.len(),
        right_only = report.right_only.len(),
        both = report.both.len(),
        "generated report"
    );
    Ok(report)
}

fn list_side(side: Side, lister: &dyn ResourceLister, options: &Options) -> Result<ResourceSet, Error> {
    let listing = lister
        .list_resources(&options.scopes, &options.selector)
        .map_err(|source| Error::Source { side, source })?;

    if !listing.errors.is_empty() {
        tracing::warn!(%side, errors = listing.errors.len(), "source reported errors");
        return Err(Error::Aggregate {
            side,
            errors: listing.errors,
        });
    }

    tracing::debug!(%side, resources = listing.resources.len(), "listed source");
    Ok(listing.resources)
}
