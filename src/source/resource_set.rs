//! Snapshots of resources and the set operations between them.

use super::key::{ResourceKey, Scope};
use crate::delta::{self, Diff};
use crate::value::Value;
use std::collections::HashMap;

/// ResourceEntry holds one resource's content and, once it has been
/// compared against its counterpart in another snapshot, the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub object: Value,
    pub diff: Option<Diff>,
}

impl ResourceEntry {
    pub fn new(object: Value) -> Self {
        ResourceEntry { object, diff: None }
    }

    /// Returns true if a diff is attached and it records at least one change.
    pub fn is_modified(&self) -> bool {
        self.diff.as_ref().is_some_and(Diff::modified)
    }
}

/// ResourceSet maps resource identities to their content.
///
/// A set is filled by a single lister and only read afterwards. Adding a
/// key that is already present replaces the earlier entry without any
/// warning beyond a debug event, so a source emitting the same identity
/// twice keeps only the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    items: HashMap<ResourceKey, ResourceEntry>,
}

impl ResourceSet {
    /// Creates a new empty ResourceSet.
    pub fn new() -> Self {
        ResourceSet {
            items: HashMap::new(),
        }
    }

    /// Inserts a resource under `(scope, gvk, name)`. Last write wins.
    pub fn add(
        &mut self,
        scope: Scope,
        gvk: impl Into<String>,
        name: impl Into<String>,
        object: Value,
    ) -> &mut Self {
        let key = ResourceKey::new(scope, gvk, name);
        if self.items.contains_key(&key) {
            tracing::debug!(key = %key, "replacing resource with duplicate identity");
        }
        self.items.insert(key, ResourceEntry::new(object));
        self
    }

    /// Returns the entry for a resource, if it exists.
    pub fn get(&self, scope: &Scope, gvk: &str, name: &str) -> Option<&ResourceEntry> {
        self.items.get(&ResourceKey::new(scope.clone(), gvk, name))
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceKey, &ResourceEntry)> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.items.keys()
    }

    /// Returns all entries ordered by key.
    pub fn sorted(&self) -> Vec<(&ResourceKey, &ResourceEntry)> {
        let mut entries: Vec<_> = self.items.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Returns a new ResourceSet with every entry of `self` whose key is
    /// absent from `other`. Entries are copied as they are, without a diff.
    pub fn except(&self, other: &ResourceSet) -> ResourceSet {
        let items = self
            .items
            .iter()
            .filter(|(key, _)| !other.contains(key))
            .map(|(key, entry)| (key.clone(), ResourceEntry::new(entry.object.clone())))
            .collect();
        ResourceSet { items }
    }

    /// Returns a new ResourceSet with every key present in both sets. Each
    /// entry carries `self`'s object and the diff from it to `other`'s.
    pub fn intersect(&self, other: &ResourceSet) -> ResourceSet {
        let (smaller, larger, self_is_smaller) = if self.len() <= other.len() {
            (self, other, true)
        } else {
            (other, self, false)
        };

        let items = smaller
            .items
            .iter()
            .filter_map(|(key, entry)| {
                let counterpart = larger.items.get(key)?;
                let (left, right) = if self_is_smaller {
                    (entry, counterpart)
                } else {
                    (counterpart, entry)
                };
                Some((
                    key.clone(),
                    ResourceEntry {
                        object: left.object.clone(),
                        diff: Some(delta::compare(&left.object, &right.object)),
                    },
                ))
            })
            .collect();
        ResourceSet { items }
    }
}

impl FromIterator<(ResourceKey, Value)> for ResourceSet {
    fn from_iter<T: IntoIterator<Item = (ResourceKey, Value)>>(iter: T) -> Self {
        ResourceSet {
            items: iter
                .into_iter()
                .map(|(key, object)| (key, ResourceEntry::new(object)))
                .collect(),
        }
    }
}
