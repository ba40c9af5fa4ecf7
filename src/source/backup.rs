//! Snapshot source backed by a backup archive.
//!
//! The archive is a gzip-compressed tarball holding one JSON document per
//! resource. Cluster-scoped resources live below a `cluster/` directory and
//! namespaced ones below `namespaces/<namespace>/`, either at the archive
//! root or nested under a per-resource directory.

use super::error::{ItemError, SourceError};
use super::includes::Includes;
use super::key::Scope;
use super::manifest::add_manifest;
use super::selector::LabelSelector;
use super::{Listing, ResourceLister};
use crate::value;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

/// Backup lists the resources stored in a backup archive.
#[derive(Debug, Clone)]
pub struct Backup {
    path: PathBuf,
}

impl Backup {
    /// Opens a backup source. Fails if the archive cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        File::open(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Backup { path })
    }

    fn archive_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Archive {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResourceLister for Backup {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn list_resources(
        &self,
        scopes: &Includes,
        selector: &LabelSelector,
    ) -> Result<Listing, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut listing = Listing::default();

        for entry in archive.entries().map_err(|e| self.archive_error(e))? {
            let mut entry = entry.map_err(|e| self.archive_error(e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = entry.path().map_err(|e| self.archive_error(e))?.into_owned();
            let location = entry_path.display().to_string();
            let Some(scope) = scope_from_path(&entry_path) else {
                tracing::trace!(entry = %location, "skipping entry outside resource directories");
                continue;
            };
            if !scopes.includes_scope(&scope) {
                continue;
            }

            let mut contents = String::new();
            if let Err(source) = entry.read_to_string(&mut contents) {
                listing.errors.push(ItemError::Read { location, source });
                continue;
            }

            let object = match value::from_json(&contents) {
                Ok(object) => object,
                Err(err) => {
                    listing.errors.push(ItemError::Decode {
                        location,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            if let Err(err) = add_manifest(
                &mut listing.resources,
                object,
                Some(scope),
                scopes,
                selector,
                &location,
            ) {
                listing.errors.push(err);
            }
        }

        tracing::debug!(
            resources = listing.resources.len(),
            errors = listing.errors.len(),
            "listed backup"
        );
        Ok(listing)
    }
}

/// Derives the scope of an archive entry from the first `cluster` or
/// `namespaces/<ns>` directory of its path. Under `resources/<type>/` the
/// type directory is never a scope, so the `namespaces` type itself stays
/// cluster-scoped.
fn scope_from_path(path: &Path) -> Option<Scope> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    // The last segment is the file itself.
    let dirs = segments.split_last()?.1;
    let start = if dirs.first() == Some(&"resources") { 2 } else { 0 };
    for (i, segment) in dirs.iter().enumerate().skip(start) {
        match *segment {
            "cluster" => return Some(Scope::Cluster),
            "namespaces" => return dirs.get(i + 1).map(|ns| Scope::Namespace(ns.to_string())),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;

    fn write_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("backup.tar.gz");
        let file = File::create(&path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, contents.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_scope_from_path() {
        assert_eq!(
            scope_from_path(Path::new("cluster/namespaces/default.json")),
            Some(Scope::Cluster)
        );
        assert_eq!(
            scope_from_path(Path::new("namespaces/default/pods/web.json")),
            Some(Scope::Namespace("default".into()))
        );
        assert_eq!(
            scope_from_path(Path::new("resources/pods/namespaces/kube-system/dns.json")),
            Some(Scope::Namespace("kube-system".into()))
        );
        assert_eq!(
            scope_from_path(Path::new("resources/namespaces/cluster/default.json")),
            Some(Scope::Cluster)
        );
        assert_eq!(
            scope_from_path(Path::new("resources/namespaces/v1-preferredversion/cluster/default.json")),
            Some(Scope::Cluster)
        );
        assert_eq!(
            scope_from_path(Path::new("resources/pods/v1-preferredversion/namespaces/web/p.json")),
            Some(Scope::Namespace("web".into()))
        );
        assert_eq!(scope_from_path(Path::new("resources/namespaces/default.json")), None);
        assert_eq!(scope_from_path(Path::new("metadata/version")), None);
        assert_eq!(scope_from_path(Path::new("namespaces/orphan.json")), None);
    }

    #[test]
    fn test_open_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Backup::open(dir.path().join("missing.tar.gz")),
            Err(SourceError::Open { .. })
        ));
    }

    #[test]
    fn test_list_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(
            dir.path(),
            &[
                (
                    "cluster/namespaces/default.json",
                    r#"{"apiVersion":"v1","kind":"Namespace","metadata":{"name":"default"}}"#,
                ),
                (
                    "namespaces/default/configmaps/cm1.json",
                    r#"{"apiVersion":"v1","kind":"ConfigMap","metadata":{"name":"cm1","labels":{"app":"web"}},"data":{"a":"1"}}"#,
                ),
                ("namespaces/default/configmaps/bad.json", "{"),
                ("metadata/version", "1"),
            ],
        );
        let backup = Backup::open(&path).unwrap();

        let listing = backup
            .list_resources(&Includes::all(), &LabelSelector::everything())
            .unwrap();
        assert_eq!(listing.resources.len(), 2);
        assert_eq!(listing.errors.len(), 1);
        assert!(listing
            .resources
            .get(&Scope::Namespace("default".into()), "/v1, Kind=ConfigMap", "cm1")
            .is_some());

        let cluster_only = backup
            .list_resources(&Includes::new(["cluster"]), &LabelSelector::everything())
            .unwrap();
        assert_eq!(cluster_only.resources.len(), 1);
        assert!(cluster_only.errors.is_empty());

        let selector: LabelSelector = "app=web".parse().unwrap();
        let selected = backup.list_resources(&Includes::all(), &selector).unwrap();
        assert_eq!(selected.resources.len(), 1);
    }

    #[test]
    fn test_list_velero_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(
            dir.path(),
            &[
                (
                    "resources/namespaces/cluster/default.json",
                    r#"{"apiVersion":"v1","kind":"Namespace","metadata":{"name":"default"}}"#,
                ),
                (
                    "resources/configmaps/namespaces/default/cm1.json",
                    r#"{"apiVersion":"v1","kind":"ConfigMap","metadata":{"name":"cm1","namespace":"default"}}"#,
                ),
            ],
        );
        let backup = Backup::open(&path).unwrap();

        let listing = backup
            .list_resources(&Includes::all(), &LabelSelector::everything())
            .unwrap();
        assert!(listing.errors.is_empty());
        assert!(listing
            .resources
            .get(&Scope::Cluster, "/v1, Kind=Namespace", "default")
            .is_some());
        assert!(listing
            .resources
            .get(&Scope::Namespace("default".into()), "/v1, Kind=ConfigMap", "cm1")
            .is_some());

        let cluster_only = backup
            .list_resources(&Includes::new(["cluster"]), &LabelSelector::everything())
            .unwrap();
        let names: Vec<&str> = cluster_only
            .resources
            .sorted()
            .iter()
            .map(|(k, _)| k.name.as_str())
            .collect();
        assert_eq!(names, vec!["default"]);
    }

    #[test]
    fn test_corrupt_archive_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.tar.gz");
        std::fs::write(&path, "definitely not gzip").unwrap();

        let err = Backup::open(&path)
            .unwrap()
            .list_resources(&Includes::all(), &LabelSelector::everything())
            .unwrap_err();
        assert!(matches!(err, SourceError::Archive { .. }));
    }
}
