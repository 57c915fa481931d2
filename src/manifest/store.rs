use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::runtime::Runtime;

use super::reference::{decode_reference, encode_reference};

const DEPENDENCIES_KEY: &str = "dependencies";

/// In-memory copy of the manifest plus the operations the package manager
/// needs on its `dependencies` object.
///
/// Nothing but `load` works until the manifest has been loaded; mutations stay
/// in memory until [`persist`](Self::persist).
pub struct DependencyStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    reference_prefix: String,
    document: Option<Map<String, Value>>,
}

impl<R: Runtime> Clone for DependencyStore<'_, R> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            path: self.path.clone(),
            reference_prefix: self.reference_prefix.clone(),
            document: self.document.clone(),
        }
    }
}

impl<'a, R: Runtime> DependencyStore<'a, R> {
    pub fn new(runtime: &'a R, path: impl Into<PathBuf>, reference_prefix: impl Into<String>) -> Self {
        Self {
            runtime,
            path: path.into(),
            reference_prefix: reference_prefix.into(),
            document: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Reads and validates the manifest, replacing any in-memory state.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&mut self) -> Result<&Map<String, Value>> {
        if !self.runtime.exists(&self.path) {
            return Err(Error::ManifestNotFound(self.path.clone()));
        }

        let content = self
            .runtime
            .read_to_string(&self.path)
            .map_err(|cause| Error::ManifestIo {
                path: self.path.clone(),
                cause,
            })?;

        let value: Value = serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
            path: self.path.clone(),
            source,
        })?;

        let Value::Object(document) = value else {
            return Err(Error::ManifestShape(self.path.clone()));
        };
        if !document.get(DEPENDENCIES_KEY).is_some_and(Value::is_object) {
            return Err(Error::ManifestShape(self.path.clone()));
        }

        debug!("Loaded manifest {:?}", self.path);
        Ok(&*self.document.insert(document))
    }

    /// The reference string written for `name` at `version`.
    pub fn encode_reference(&self, name: &str, version: &str) -> String {
        encode_reference(&self.reference_prefix, name, version)
    }

    /// Points `name` at the local archive for `version`.
    pub fn upsert(&mut self, name: &str, version: &str) -> Result<()> {
        let reference = self.encode_reference(name, version);
        debug!("Setting dependency {} = {}", name, reference);
        self.dependencies_mut()?
            .insert(name.to_string(), Value::String(reference));
        Ok(())
    }

    /// Drops `name` from the dependencies. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        let removed = self.dependencies_mut()?.shift_remove(name).is_some();
        if removed {
            debug!("Removed dependency {}", name);
        }
        Ok(removed)
    }

    /// Version recorded for `name`, `None` if the manifest has no such key.
    ///
    /// A key whose value is not one of our references is an error rather than
    /// a guess.
    pub fn lookup_version(&self, name: &str) -> Result<Option<String>> {
        let Some(value) = self.dependencies()?.get(name) else {
            return Ok(None);
        };

        let reference_error = || Error::ReferenceFormat {
            package: name.to_string(),
            reference: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };

        let reference = value.as_str().ok_or_else(reference_error)?;
        decode_reference(&self.reference_prefix, name, reference)
            .map(|version| Some(version.to_string()))
            .ok_or_else(reference_error)
    }

    /// Writes the whole manifest back to disk.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn persist(&self) -> Result<()> {
        let document = self.document.as_ref().ok_or(Error::StoreNotLoaded)?;

        let io_error = |cause: anyhow::Error| Error::ManifestIo {
            path: self.path.clone(),
            cause,
        };

        let content = serde_json::to_string_pretty(document).map_err(|e| io_error(e.into()))?;
        self.runtime
            .write(&self.path, content.as_bytes())
            .map_err(io_error)?;

        debug!("Saved manifest {:?}", self.path);
        Ok(())
    }

    fn dependencies(&self) -> Result<&Map<String, Value>> {
        self.document
            .as_ref()
            .ok_or(Error::StoreNotLoaded)?
            .get(DEPENDENCIES_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::ManifestShape(self.path.clone()))
    }

    fn dependencies_mut(&mut self) -> Result<&mut Map<String, Value>> {
        let path = &self.path;
        self.document
            .as_mut()
            .ok_or(Error::StoreNotLoaded)?
            .get_mut(DEPENDENCIES_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::ManifestShape(path.clone()))
    }
}
