use anyhow::Result;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{controller::PackageManager, registry::RegistrySource, runtime::Runtime};

use super::{config::Config, finish, progress_printer};

/// Remove a package from the project manifest and delete its cached archives
#[tracing::instrument(skip(config, cancel))]
pub async fn remove<R: Runtime, S: RegistrySource>(
    config: Config<R, S>,
    name: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    let Config {
        runtime,
        registry,
        settings,
    } = config;

    let manager =
        PackageManager::new(&runtime, registry, &settings).with_progress(progress_printer());
    manager.refresh(cancel).await?;

    if manager.package(name)?.installed.is_none() {
        println!("{} is not installed.", name);
        return Ok(());
    }

    debug!("Removing {}", name);
    manager.select(name, None)?;
    finish(manager.commit(&[name], cancel).await?)
}
