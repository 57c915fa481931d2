//! Error taxonomy for the catalog, store, cache and controller layers.
//!
//! Collaborators (filesystem runtime, HTTP client) report failures as
//! `anyhow::Error`; those are wrapped here as the `cause` of a typed variant so
//! callers can match on what went wrong without losing the context chain.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed catalog entry '{link}': {reason}")]
    MalformedCatalogEntry { link: String, reason: String },

    #[error("Manifest not found at {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Failed to parse manifest {}: {source}", .path.display())]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Manifest {} has no \"dependencies\" object", .0.display())]
    ManifestShape(PathBuf),

    #[error("Manifest I/O error at {}: {cause:#}", .path.display())]
    ManifestIo { path: PathBuf, cause: anyhow::Error },

    #[error("Dependency store used before the manifest was loaded")]
    StoreNotLoaded,

    #[error("Dependency '{package}' has an unrecognised reference '{reference}'")]
    ReferenceFormat { package: String, reference: String },

    #[error("Cache I/O error at {}: {cause:#}", .path.display())]
    CacheIo { path: PathBuf, cause: anyhow::Error },

    #[error("Failed to download {url}: {cause:#}")]
    Download { url: String, cause: anyhow::Error },

    #[error("Another operation is already in progress")]
    OperationInProgress,

    #[error("Package '{0}' is not in the catalog")]
    PackageNotFound(String),

    #[error("Package '{package}' has no version '{version}'")]
    UnknownVersion { package: String, version: String },

    #[error("Operation cancelled while processing '{0}'")]
    Cancelled(String),

    #[error("Failed to apply changes to '{package}': {source}")]
    Package {
        package: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the package a commit failure belongs to, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            Error::Package { package, .. } | Error::Cancelled(package) => Some(package),
            _ => None,
        }
    }

    pub(crate) fn cache_io(path: impl Into<PathBuf>, cause: anyhow::Error) -> Self {
        Error::CacheIo {
            path: path.into(),
            cause,
        }
    }
}
