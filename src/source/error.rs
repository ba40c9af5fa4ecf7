//! Errors reported by snapshot sources.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A source that cannot be opened or reached at all.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("format for source must be <type>=<location>, got '{0}'")]
    InvalidDescriptor(String),

    #[error("source type must be one of cluster, repo, backup, directory, got '{0}'")]
    UnknownType(String),

    #[error("opening {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading backup archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("loading kubeconfig: {0}")]
    Kubeconfig(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{context}: {source}")]
    Kube {
        context: String,
        #[source]
        source: Box<kube::Error>,
    },

    #[error("starting runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("cloning {url}: {message}")]
    Clone { url: String, message: String },
}

/// A single resource, or a single resource type, that could not be read.
/// The rest of the source is still listed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("reading {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("decoding {location}: {message}")]
    Decode { location: String, message: String },

    #[error("{location}: {reason}")]
    Invalid { location: String, reason: String },

    #[error("listing {resource} in {scope}: {source}")]
    List {
        resource: String,
        scope: String,
        #[source]
        source: Box<kube::Error>,
    },
}
