//! Reconciliation between the remote catalog, the archive cache and the
//! project manifest.
//!
//! [`PackageManager`] owns the package list for a session. `refresh` rebuilds
//! it from the catalog and the manifest, `select` records what the user wants,
//! and `commit` makes the cache and the manifest match that selection.
//!
//! Only one operation runs at a time. The state sits behind an async mutex
//! that is only ever `try_lock`ed, so an overlapping call gets
//! [`Error::OperationInProgress`] instead of queueing up.

mod report;

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::cache::ArchiveCache;
use crate::catalog::CatalogParser;
use crate::error::{Error, Result};
use crate::manifest::DependencyStore;
use crate::package::{PackageAction, PackageEntry};
use crate::registry::RegistrySource;
use crate::runtime::Runtime;
use crate::settings::Settings;

pub use report::{AppliedChange, CommitReport};

/// Called before each package of a commit batch with
/// `(package name, index in batch, batch size)`.
pub type ProgressCallback = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

struct State<'a, R: Runtime> {
    store: DependencyStore<'a, R>,
    packages: Vec<PackageEntry>,
}

pub struct PackageManager<'a, R: Runtime, S: RegistrySource> {
    source: S,
    parser: CatalogParser,
    cache: ArchiveCache<'a, R>,
    state: Mutex<State<'a, R>>,
    progress: Option<ProgressCallback>,
}

impl<'a, R: Runtime, S: RegistrySource> PackageManager<'a, R, S> {
    pub fn new(runtime: &'a R, source: S, settings: &Settings) -> Self {
        Self {
            source,
            parser: CatalogParser::new(&settings.registry_prefix, &settings.namespace),
            cache: ArchiveCache::new(runtime, settings.cache_dir()),
            state: Mutex::new(State {
                store: DependencyStore::new(
                    runtime,
                    settings.manifest_path(),
                    &settings.local_reference_prefix,
                ),
                packages: Vec::new(),
            }),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State<'a, R>>> {
        self.state.try_lock().map_err(|_| Error::OperationInProgress)
    }

    /// Re-fetches the catalog, reloads the manifest and rebuilds the package
    /// list. Pending selections are discarded: every package comes back with
    /// `selected == installed`.
    ///
    /// Nothing changes if any step fails.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<Vec<PackageEntry>> {
        let mut state = self.lock()?;

        info!("Loading catalog from {}...", self.source.catalog_url());
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled(self.source.catalog_url().to_string()));
            }
            text = self.source.fetch_catalog() => text.map_err(|cause| Error::Download {
                url: self.source.catalog_url().to_string(),
                cause,
            })?,
        };

        let mut packages = self.parser.parse(&text)?;

        let mut store = state.store.clone();
        store.load()?;
        apply_installed(&store, &mut packages)?;

        state.store = store;
        state.packages = packages;
        info!("Catalog has {} packages", state.packages.len());
        Ok(state.packages.clone())
    }

    /// Re-reads the manifest for the current package list without touching
    /// the network. Pending selections are discarded.
    #[tracing::instrument(skip(self))]
    pub fn resync(&self) -> Result<Vec<PackageEntry>> {
        let mut state = self.lock()?;

        let mut store = state.store.clone();
        store.load()?;
        let mut packages = state.packages.clone();
        apply_installed(&store, &mut packages)?;

        state.store = store;
        state.packages = packages;
        Ok(state.packages.clone())
    }

    /// Snapshot of the current package list.
    pub fn packages(&self) -> Result<Vec<PackageEntry>> {
        Ok(self.lock()?.packages.clone())
    }

    pub fn package(&self, name: &str) -> Result<PackageEntry> {
        self.lock()?
            .packages
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))
    }

    /// Records the version the user wants; `None` means "not installed".
    /// Nothing happens on disk until [`commit`](Self::commit).
    pub fn select(&self, name: &str, version: Option<&str>) -> Result<()> {
        let mut state = self.lock()?;
        let package = state
            .packages
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;

        if let Some(version) = version
            && !package.has_version(version)
        {
            return Err(Error::UnknownVersion {
                package: name.to_string(),
                version: version.to_string(),
            });
        }

        debug!("Selecting {} = {:?}", name, version);
        package.selected = version.map(String::from);
        Ok(())
    }

    /// Applies the pending action of each named package, in catalog order,
    /// then writes the manifest once.
    ///
    /// Unknown names are rejected before anything is touched. Per-package
    /// failures stop the batch and are reported in the returned
    /// [`CommitReport`]; an `Err` means the batch as a whole could not run or
    /// the manifest could not be written.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn commit(&self, names: &[&str], cancel: &CancellationToken) -> Result<CommitReport> {
        let mut state = self.lock()?;

        if let Some(unknown) = names
            .iter()
            .find(|name| !state.packages.iter().any(|p| p.name() == **name))
        {
            return Err(Error::PackageNotFound(unknown.to_string()));
        }

        let targets: Vec<usize> = state
            .packages
            .iter()
            .enumerate()
            .filter(|(_, p)| names.contains(&p.name()))
            .map(|(index, _)| index)
            .collect();

        self.run_batch(&mut state, targets, cancel).await
    }

    /// Commits every package whose selection differs from what is installed.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn commit_all(&self, cancel: &CancellationToken) -> Result<CommitReport> {
        let mut state = self.lock()?;

        let targets: Vec<usize> = state
            .packages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_pending())
            .map(|(index, _)| index)
            .collect();

        self.run_batch(&mut state, targets, cancel).await
    }

    async fn run_batch(
        &self,
        state: &mut State<'a, R>,
        targets: Vec<usize>,
        cancel: &CancellationToken,
    ) -> Result<CommitReport> {
        if !state.store.is_loaded() {
            return Err(Error::StoreNotLoaded);
        }

        // Mutations go to a copy that only replaces the live store once it is on disk
        let mut staged = state.store.clone();
        let mut report = CommitReport::default();
        let total = targets.len();

        for (position, &index) in targets.iter().enumerate() {
            let package = &state.packages[index];

            if let Some(progress) = &self.progress {
                progress(package.name(), position, total);
            }

            if cancel.is_cancelled() {
                report.failure = Some(Error::Cancelled(package.name().to_string()));
                break;
            }

            match self.apply(package, &mut staged, cancel).await {
                Ok(Some(change)) => report.changes.push(change),
                Ok(None) => debug!("Nothing to do for {}", package.name()),
                Err(error @ Error::Cancelled(_)) => {
                    report.failure = Some(error);
                    break;
                }
                Err(error) => {
                    report.failure = Some(Error::Package {
                        package: package.name().to_string(),
                        source: Box::new(error),
                    });
                    break;
                }
            }
        }

        staged.persist()?;
        state.store = staged;

        for change in &report.changes {
            let Some(package) = state.packages.iter_mut().find(|p| p.name() == change.name())
            else {
                continue;
            };
            match change {
                AppliedChange::Installed { version, .. } => {
                    package.installed = Some(version.clone());
                    package.selected = Some(version.clone());
                }
                AppliedChange::Removed { .. } => package.reset_to(None),
            }
        }

        if let Some(failure) = &report.failure {
            info!(
                "Commit stopped after {} change(s): {}",
                report.changes.len(),
                failure
            );
        } else {
            info!("Committed {} change(s)", report.changes.len());
        }
        Ok(report)
    }

    /// Performs the cache side of one package's pending action and records it
    /// in `staged`. The download happens before any archive is evicted, so a
    /// failed download leaves the package as it was.
    async fn apply(
        &self,
        package: &PackageEntry,
        staged: &mut DependencyStore<'a, R>,
        cancel: &CancellationToken,
    ) -> Result<Option<AppliedChange>> {
        let name = package.name();

        match (package.action(), package.selected.as_deref()) {
            (PackageAction::Remove, _) => {
                let version = package.installed.clone().unwrap_or_default();
                info!("Removing {} {}", name, version);

                self.cache.evict(name)?;
                staged.remove(name)?;

                Ok(Some(AppliedChange::Removed {
                    name: name.to_string(),
                    version,
                }))
            }
            (PackageAction::Install | PackageAction::Change, Some(version)) => {
                info!("Installing {} {}", name, version);

                let bytes = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled(name.to_string())),
                    bytes = self.source.fetch_archive(name, version) => {
                        bytes.map_err(|cause| Error::Download {
                            url: self.source.archive_url(name, version),
                            cause,
                        })?
                    }
                };

                let evicted = self.cache.evict(name)?;
                debug!("Evicted {} old archive(s) of {}", evicted, name);
                self.cache.store(name, version, &bytes)?;
                staged.upsert(name, version)?;

                Ok(Some(AppliedChange::Installed {
                    name: name.to_string(),
                    version: version.to_string(),
                    previous: package.installed.clone(),
                }))
            }
            _ => Ok(None),
        }
    }
}

fn apply_installed<R: Runtime>(
    store: &DependencyStore<'_, R>,
    packages: &mut [PackageEntry],
) -> Result<()> {
    for package in packages.iter_mut() {
        let installed = store.lookup_version(package.name())?;
        package.reset_to(installed);
    }
    Ok(())
}
