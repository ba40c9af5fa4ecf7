//! Scope filters.

use super::key::Scope;
use std::collections::BTreeSet;

/// Includes is the set of scope names a lister keeps: `cluster` for
/// cluster-scoped resources and a namespace name for namespaced ones.
///
/// An empty set includes everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes {
    items: BTreeSet<String>,
}

impl Includes {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Includes {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Includes every scope.
    pub fn all() -> Self {
        Includes::default()
    }

    pub fn should_include(&self, item: &str) -> bool {
        self.items.is_empty() || self.items.contains(item)
    }

    pub fn includes_scope(&self, scope: &Scope) -> bool {
        self.should_include(scope.filter_name())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_includes_everything() {
        let includes = Includes::all();
        assert!(includes.should_include("cluster"));
        assert!(includes.includes_scope(&Scope::Namespace("default".into())));
        assert!(includes.includes_scope(&Scope::Cluster));
    }

    #[test]
    fn test_cluster_only() {
        let includes = Includes::new(["cluster"]);
        assert!(includes.includes_scope(&Scope::Cluster));
        assert!(!includes.includes_scope(&Scope::Namespace("default".into())));
    }

    #[test]
    fn test_namespaces() {
        let includes = Includes::new(vec!["default".to_string(), "kube-system".to_string()]);
        assert!(includes.should_include("default"));
        assert!(includes.should_include("kube-system"));
        assert!(!includes.should_include("cluster"));
        assert!(!includes.should_include("ns:default"));
    }
}
