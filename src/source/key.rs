//! Resource identity.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the components of an encoded [`ResourceKey`].
pub const KEY_SEPARATOR: &str = "||";

const CLUSTER_SCOPE: &str = "cluster";
const NAMESPACE_PREFIX: &str = "ns:";

/// Errors that can occur when decoding a [`ResourceKey`] or a [`Scope`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyFormatError {
    #[error("key {0} is not formatted properly")]
    Parts(String),

    #[error("scope {0} is neither 'cluster' nor 'ns:<name>'")]
    Scope(String),
}

/// Scope is where a resource lives: cluster-wide or inside a namespace.
///
/// `Cluster` orders before every namespace, matching the order of the
/// encoded forms `cluster` and `ns:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Cluster,
    Namespace(String),
}

impl Scope {
    /// Builds the scope of an object from its (possibly empty) namespace.
    pub fn from_namespace(namespace: Option<&str>) -> Self {
        match namespace {
            None | Some("") => Scope::Cluster,
            Some(ns) => Scope::Namespace(ns.to_string()),
        }
    }

    /// Name matched against a scope filter: `cluster`, or the bare
    /// namespace name.
    pub fn filter_name(&self) -> &str {
        match self {
            Scope::Cluster => CLUSTER_SCOPE,
            Scope::Namespace(ns) => ns,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Cluster => write!(f, "{}", CLUSTER_SCOPE),
            Scope::Namespace(ns) => write!(f, "{}{}", NAMESPACE_PREFIX, ns),
        }
    }
}

impl FromStr for Scope {
    type Err = KeyFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CLUSTER_SCOPE {
            return Ok(Scope::Cluster);
        }
        match s.strip_prefix(NAMESPACE_PREFIX) {
            Some(ns) if !ns.is_empty() => Ok(Scope::Namespace(ns.to_string())),
            _ => Err(KeyFormatError::Scope(s.to_string())),
        }
    }
}

/// ResourceKey identifies one resource across snapshots.
///
/// Keys order by scope, then type, then name, so sorting a set of keys
/// makes every scope and every (scope, type) pair a contiguous run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub scope: Scope,
    pub gvk: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(scope: Scope, gvk: impl Into<String>, name: impl Into<String>) -> Self {
        ResourceKey {
            scope,
            gvk: gvk.into(),
            name: name.into(),
        }
    }

    /// Returns the encoded string form, `<scope>||<type>||<name>`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Returns the constituent parts (scope, type, name).
    pub fn parts(&self) -> (&Scope, &str, &str) {
        (&self.scope, &self.gvk, &self.name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.scope,
            self.gvk,
            self.name,
            sep = KEY_SEPARATOR
        )
    }
}

impl FromStr for ResourceKey {
    type Err = KeyFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(KEY_SEPARATOR).collect();
        match parts.as_slice() {
            [scope, gvk, name] => Ok(ResourceKey::new(scope.parse()?, *gvk, *name)),
            _ => Err(KeyFormatError::Parts(s.to_string())),
        }
    }
}
