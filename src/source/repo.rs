//! Snapshot source backed by a git repository of manifests.

use super::directory::list_tree;
use super::error::SourceError;
use super::includes::Includes;
use super::selector::LabelSelector;
use super::{Listing, ResourceLister};
use std::process::Command;
use tempfile::TempDir;
use tracing::instrument;

/// Repo shallow-clones a repository into a temporary directory and lists it
/// like a [`Directory`](super::Directory). The checkout is removed when the
/// source is dropped.
#[derive(Debug)]
pub struct Repo {
    url: String,
    reference: Option<String>,
    checkout: TempDir,
}

impl Repo {
    /// Clones `location`, given as `<url>` or `<url>#<ref>`.
    pub fn fetch(location: &str) -> Result<Self, SourceError> {
        let (url, reference) = parse_location(location);
        let clone_error = |message: String| SourceError::Clone {
            url: url.to_string(),
            message,
        };

        let checkout = tempfile::Builder::new()
            .prefix("ksd-repo-")
            .tempdir()
            .map_err(|e| clone_error(e.to_string()))?;

        let mut command = Command::new("git");
        command.args(["clone", "--quiet", "--depth", "1"]);
        if let Some(reference) = reference {
            command.args(["--branch", reference]);
        }
        command.arg("--").arg(url).arg(checkout.path());

        tracing::debug!(url, reference, "cloning repository");
        let output = command
            .output()
            .map_err(|e| clone_error(format!("running git: {}", e)))?;
        if !output.status.success() {
            return Err(clone_error(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(Repo {
            url: url.to_string(),
            reference: reference.map(str::to_string),
            checkout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl ResourceLister for Repo {
    #[instrument(skip_all, fields(url = %self.url))]
    fn list_resources(
        &self,
        scopes: &Includes,
        selector: &LabelSelector,
    ) -> Result<Listing, SourceError> {
        Ok(list_tree(self.checkout.path(), scopes, selector))
    }
}

/// Splits `<url>#<ref>` into its parts. An empty ref means the default
/// branch.
fn parse_location(location: &str) -> (&str, Option<&str>) {
    match location.rsplit_once('#') {
        Some((url, reference)) if !reference.is_empty() => (url, Some(reference)),
        Some((url, _)) => (url, None),
        None => (location, None),
    }
}
