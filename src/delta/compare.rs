//! Field-level comparison of two payloads.

use crate::fieldpath::{Path, PathElement};
use crate::value::Value;
use std::fmt;

/// Change is what happened at one path between the base and the other value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Present only on the right-hand side.
    Added(Value),
    /// Present only on the left-hand side.
    Removed(Value),
    /// Present on both sides with different values.
    Modified { old: Value, new: Value },
}

/// Delta is one change together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub path: Path,
    pub change: Change,
}

/// Diff holds the result of comparing two payloads.
///
/// Deltas are kept in walk order: map fields by name, list elements by
/// position. An empty Diff means the payloads were equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    deltas: Vec<Delta>,
}

impl Diff {
    /// Creates a new empty Diff.
    pub fn new() -> Self {
        Diff { deltas: Vec::new() }
    }

    /// Returns true if there are no changes.
    pub fn is_same(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Returns true if at least one change was recorded.
    pub fn modified(&self) -> bool {
        !self.is_same()
    }

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn has_added(&self) -> bool {
        self.deltas.iter().any(|d| matches!(d.change, Change::Added(_)))
    }

    pub fn has_removed(&self) -> bool {
        self.deltas.iter().any(|d| matches!(d.change, Change::Removed(_)))
    }

    pub fn has_modified(&self) -> bool {
        self.deltas
            .iter()
            .any(|d| matches!(d.change, Change::Modified { .. }))
    }

    fn record(&mut self, path: &Path, change: Change) {
        self.deltas.push(Delta {
            path: path.clone(),
            change,
        });
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, delta) in self.deltas.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let marker = match delta.change {
                Change::Added(_) => '+',
                Change::Removed(_) => '-',
                Change::Modified { .. } => '~',
            };
            write!(f, "{} {}", marker, delta.path)?;
        }
        Ok(())
    }
}

/// Compares `lhs` (the base) against `rhs`.
///
/// Maps are compared field by field, lists position by position. Any other
/// pair of values, including values of different kinds, is reported as a
/// single modification.
pub fn compare(lhs: &Value, rhs: &Value) -> Diff {
    let mut diff = Diff::new();
    let mut path = Path::new();
    compare_values(lhs, rhs, &mut path, &mut diff);
    diff
}

fn compare_values(lhs: &Value, rhs: &Value, path: &mut Path, diff: &mut Diff) {
    match (lhs, rhs) {
        (Value::Map(lhs_fields), Value::Map(rhs_fields)) => {
            // Both field maps iterate in name order, so a merge walk visits
            // every name once.
            let mut lhs_iter = lhs_fields.iter().peekable();
            let mut rhs_iter = rhs_fields.iter().peekable();
            loop {
                let step = match (lhs_iter.peek(), rhs_iter.peek()) {
                    (None, None) => break,
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (Some((l, _)), Some((r, _))) => l.cmp(r),
                };
                match step {
                    std::cmp::Ordering::Less => {
                        if let Some((name, value)) = lhs_iter.next() {
                            path.push(PathElement::field_name(name.clone()));
                            diff.record(path, Change::Removed(value.clone()));
                            path.pop();
                        }
                    }
                    std::cmp::Ordering::Greater => {
                        if let Some((name, value)) = rhs_iter.next() {
                            path.push(PathElement::field_name(name.clone()));
                            diff.record(path, Change::Added(value.clone()));
                            path.pop();
                        }
                    }
                    std::cmp::Ordering::Equal => {
                        if let (Some((name, l)), Some((_, r))) = (lhs_iter.next(), rhs_iter.next()) {
                            path.push(PathElement::field_name(name.clone()));
                            compare_values(l, r, path, diff);
                            path.pop();
                        }
                    }
                }
            }
        }
        (Value::List(lhs_items), Value::List(rhs_items)) => {
            let shared = lhs_items.len().min(rhs_items.len());
            for i in 0..shared {
                path.push(PathElement::index(i));
                compare_values(&lhs_items[i], &rhs_items[i], path, diff);
                path.pop();
            }
            for (i, item) in lhs_items.iter().enumerate().skip(shared) {
                path.push(PathElement::index(i));
                diff.record(path, Change::Removed(item.clone()));
                path.pop();
            }
            for (i, item) in rhs_items.iter().enumerate().skip(shared) {
                path.push(PathElement::index(i));
                diff.record(path, Change::Added(item.clone()));
                path.pop();
            }
        }
        _ => {
            if lhs != rhs {
                diff.record(
                    path,
                    Change::Modified {
                        old: lhs.clone(),
                        new: rhs.clone(),
                    },
                );
            }
        }
    }
}
