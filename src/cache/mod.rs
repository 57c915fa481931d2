//! Local archive cache.
//!
//! Archives live flat in one directory as `{name}-{version}.tgz`. The
//! directory is only created when the first archive is stored.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::settings::ARCHIVE_EXTENSION;

pub struct ArchiveCache<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> ArchiveCache<'a, R> {
    pub fn new(runtime: &'a R, dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(name: &str, version: &str) -> String {
        format!("{}-{}{}", name, version, ARCHIVE_EXTENSION)
    }

    pub fn archive_path(&self, name: &str, version: &str) -> PathBuf {
        self.dir.join(Self::file_name(name, version))
    }

    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.runtime.exists(&self.archive_path(name, version))
    }

    /// Writes an archive, replacing any file with the same name.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn store(&self, name: &str, version: &str, bytes: &[u8]) -> Result<PathBuf> {
        if !self.runtime.exists(&self.dir) {
            debug!("Creating cache directory {:?}", self.dir);
            self.runtime
                .create_dir_all(&self.dir)
                .map_err(|e| Error::cache_io(&self.dir, e))?;
        }

        let path = self.archive_path(name, version);
        self.runtime
            .write(&path, bytes)
            .map_err(|e| Error::cache_io(&path, e))?;

        debug!("Stored {:?}", path);
        Ok(path)
    }

    /// Cached archives of `name`, any version.
    pub fn archives(&self, name: &str) -> Result<Vec<PathBuf>> {
        if !self.runtime.is_dir(&self.dir) {
            return Ok(Vec::new());
        }

        let prefix = format!("{}-", name);
        let mut archives: Vec<PathBuf> = self
            .runtime
            .read_dir(&self.dir)
            .map_err(|e| Error::cache_io(&self.dir, e))?
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        archives.sort();
        Ok(archives)
    }

    /// Deletes every cached archive of `name`, whatever its version.
    /// Returns the number of files removed.
    #[tracing::instrument(skip(self))]
    pub fn evict(&self, name: &str) -> Result<usize> {
        let archives = self.archives(name)?;
        for path in &archives {
            debug!("Removing {:?}", path);
            self.runtime
                .remove_file(path)
                .map_err(|e| Error::cache_io(path, e))?;
        }
        Ok(archives.len())
    }
}
