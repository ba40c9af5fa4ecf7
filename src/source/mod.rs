//! Source module - Snapshots of resources and where they come from.
//!
//! A [`ResourceLister`] produces a [`ResourceSet`] from some backing
//! source: a live cluster, a backup archive, a local directory or a git
//! repository. Every source applies the same scope filter and label
//! selector and builds keys the same way, so two snapshots are always
//! comparable.

mod backup;
mod cluster;
mod directory;
mod error;
mod includes;
mod key;
mod manifest;
mod repo;
mod resource_set;
mod selector;

#[cfg(test)]
mod resource_set_test;

pub use backup::*;
pub use cluster::*;
pub use directory::*;
pub use error::*;
pub use includes::*;
pub use key::*;
pub use manifest::{GroupVersionKind, Manifest};
pub use repo::*;
pub use resource_set::*;
pub use selector::*;

use std::fmt;
use std::str::FromStr;

/// Listing is what a lister found: the resources it could read, and an
/// error for every resource or resource type it could not.
#[derive(Debug, Default)]
pub struct Listing {
    pub resources: ResourceSet,
    pub errors: Vec<ItemError>,
}

/// ResourceLister produces a snapshot of one source.
///
/// Implementations must apply `scopes` and `selector` themselves. A fatal
/// error means nothing could be listed; per-resource failures go into
/// [`Listing::errors`] and listing continues.
pub trait ResourceLister {
    fn list_resources(
        &self,
        scopes: &Includes,
        selector: &LabelSelector,
    ) -> Result<Listing, SourceError>;
}

/// The kinds of source a descriptor can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Cluster,
    Repo,
    Backup,
    Directory,
}

impl FromStr for SourceType {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster" => Ok(SourceType::Cluster),
            "repo" => Ok(SourceType::Repo),
            "backup" => Ok(SourceType::Backup),
            "directory" => Ok(SourceType::Directory),
            other => Err(SourceError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Cluster => "cluster",
            SourceType::Repo => "repo",
            SourceType::Backup => "backup",
            SourceType::Directory => "directory",
        };
        write!(f, "{}", name)
    }
}

/// SourceDescriptor is the `<type>=<location>` form sources are named by
/// on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub source_type: SourceType,
    pub location: String,
}

impl SourceDescriptor {
    /// Opens the described source.
    pub fn open(&self) -> Result<Box<dyn ResourceLister>, SourceError> {
        get(self.source_type, &self.location)
    }
}

impl FromStr for SourceDescriptor {
    type Err = SourceError;

    /// Splits at the first `=`, so locations may contain `=` themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source_type, location) = s
            .split_once('=')
            .ok_or_else(|| SourceError::InvalidDescriptor(s.to_string()))?;
        Ok(SourceDescriptor {
            source_type: source_type.parse()?,
            location: location.to_string(),
        })
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.source_type, self.location)
    }
}

/// Opens a source of the given type at `location`.
pub fn get(source_type: SourceType, location: &str) -> Result<Box<dyn ResourceLister>, SourceError> {
    tracing::debug!(%source_type, location, "opening source");
    Ok(match source_type {
        SourceType::Cluster => Box::new(Cluster::connect(location)?),
        SourceType::Repo => Box::new(Repo::fetch(location)?),
        SourceType::Backup => Box::new(Backup::open(location)?),
        SourceType::Directory => Box::new(Directory::open(location)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_descriptor() {
        let descriptor: SourceDescriptor = "directory=./manifests".parse().unwrap();
        assert_eq!(
            descriptor,
            SourceDescriptor {
                source_type: SourceType::Directory,
                location: "./manifests".to_string(),
            }
        );
        assert_eq!(descriptor.to_string(), "directory=./manifests");

        let cluster: SourceDescriptor = "cluster=".parse().unwrap();
        assert_eq!(cluster.source_type, SourceType::Cluster);
        assert_eq!(cluster.location, "");

        let repo: SourceDescriptor = "repo=https://example.com/r.git#a=b".parse().unwrap();
        assert_eq!(repo.location, "https://example.com/r.git#a=b");
    }

    #[test]
    fn test_parse_descriptor_errors() {
        assert!(matches!(
            "./manifests".parse::<SourceDescriptor>(),
            Err(SourceError::InvalidDescriptor(_))
        ));
        assert!(matches!(
            "s3=bucket".parse::<SourceDescriptor>(),
            Err(SourceError::UnknownType(t)) if t == "s3"
        ));
    }

    #[test]
    fn test_open_directory_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor: SourceDescriptor = format!("directory={}", dir.path().display()).parse().unwrap();
        let lister = descriptor.open().unwrap();
        let listing = lister
            .list_resources(&Includes::all(), &LabelSelector::everything())
            .unwrap();
        assert!(listing.resources.is_empty());
    }
}
