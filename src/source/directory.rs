//! Snapshot source backed by a local directory of manifests.

use super::error::{ItemError, SourceError};
use super::includes::Includes;
use super::manifest::add_manifest;
use super::selector::LabelSelector;
use super::{Listing, ResourceLister};
use crate::value::{self, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::instrument;
use walkdir::WalkDir;

/// Directory lists every `.json`, `.yaml` and `.yml` file below a root
/// directory, recursively.
#[derive(Debug, Clone)]
pub struct Directory {
    path: PathBuf,
}

impl Directory {
    /// Opens a directory source. Fails if `path` is not a readable directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        fs::read_dir(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Directory { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceLister for Directory {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn list_resources(
        &self,
        scopes: &Includes,
        selector: &LabelSelector,
    ) -> Result<Listing, SourceError> {
        Ok(list_tree(&self.path, scopes, selector))
    }
}

/// Walks `root` in file name order and collects every manifest found.
/// Symbolic links are followed; a link loop is an item error. `.git`
/// directories are not descended into.
pub(crate) fn list_tree(root: &Path, scopes: &Includes, selector: &LabelSelector) -> Listing {
    let mut listing = Listing::default();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let location = err
                    .path()
                    .unwrap_or(root)
                    .display()
                    .to_string();
                listing.errors.push(ItemError::Read {
                    location,
                    source: io::Error::from(err),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(format) = ManifestFormat::from_path(path) else {
            continue;
        };
        let location = path.display().to_string();

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(source) => {
                listing.errors.push(ItemError::Read { location, source });
                continue;
            }
        };

        let documents = match format.decode(&contents) {
            Ok(documents) => documents,
            Err(message) => {
                listing.errors.push(ItemError::Decode { location, message });
                continue;
            }
        };

        tracing::trace!(file = %location, documents = documents.len(), "read manifest file");

        for object in documents {
            if let Err(err) = add_manifest(&mut listing.resources, object, None, scopes, selector, &location) {
                listing.errors.push(err);
            }
        }
    }

    tracing::debug!(
        resources = listing.resources.len(),
        errors = listing.errors.len(),
        "listed directory"
    );
    listing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestFormat {
    Json,
    Yaml,
}

impl ManifestFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ManifestFormat::Json),
            "yaml" | "yml" => Some(ManifestFormat::Yaml),
            _ => None,
        }
    }

    fn decode(self, contents: &str) -> Result<Vec<Value>, String> {
        match self {
            ManifestFormat::Json => value::from_json(contents)
                .map(|v| vec![v])
                .map_err(|e| e.to_string()),
            ManifestFormat::Yaml => value::from_yaml_documents(contents).map_err(|e| e.to_string()),
        }
    }
}
