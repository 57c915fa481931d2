//! Locations and naming conventions shared by the catalog, store and cache.

use std::path::PathBuf;

/// Page listing every published archive.
pub const DEFAULT_CATALOG_URL: &str = "https://developers.google.com/unity/archive";

/// Base URL archives are served from: `{prefix}{name}/{name}-{version}.tgz`.
pub const DEFAULT_REGISTRY_PREFIX: &str = "https://dl.google.com/games/registry/unity/";

/// Only catalog packages whose name starts with this token are kept.
pub const DEFAULT_NAMESPACE: &str = "com";

pub const ARCHIVE_EXTENSION: &str = ".tgz";

/// Manifest location relative to the project root.
pub const MANIFEST_PATH: &str = "Packages/manifest.json";

/// Archive cache location relative to the project root.
pub const CACHE_DIR: &str = "GooglePackages";

/// Prefix of the manifest references; resolved by the editor relative to `Packages/`.
pub const LOCAL_REFERENCE_PREFIX: &str = "file:../GooglePackages/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project_root: PathBuf,
    pub catalog_url: String,
    pub registry_prefix: String,
    pub namespace: String,
    pub local_reference_prefix: String,
}

impl Settings {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            registry_prefix: DEFAULT_REGISTRY_PREFIX.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            local_reference_prefix: LOCAL_REFERENCE_PREFIX.to_string(),
        }
    }

    pub fn with_catalog_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.catalog_url = url;
        }
        self
    }

    /// Overrides the archive base URL; a trailing `/` is added when missing.
    pub fn with_registry_prefix(mut self, prefix: Option<String>) -> Self {
        if let Some(mut prefix) = prefix {
            if !prefix.ends_with('/') {
                prefix.push('/');
            }
            self.registry_prefix = prefix;
        }
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(MANIFEST_PATH)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.project_root.join(CACHE_DIR)
    }
}
