use anyhow::{Result, bail};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{controller::PackageManager, registry::RegistrySource, runtime::Runtime};

use super::{config::Config, finish, parse_request, progress_printer};

/// Version keyword that selects "not installed".
const NONE_VERSION: &str = "none";

/// Select several packages at once and commit them as one batch.
///
/// Each request is `name@version`, or `name@none` to remove. All selections
/// are validated before anything is downloaded.
#[tracing::instrument(skip(config, cancel))]
pub async fn apply<R: Runtime, S: RegistrySource>(
    config: Config<R, S>,
    requests: &[String],
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

    let mut names = Vec::with_capacity(requests.len());
    for request in requests {
        let (name, version) = match parse_request(request) {
            (name, Some(version)) if !version.is_empty() => (name, version),
            _ => bail!(
                "Invalid request '{}': expected <name>@<version> or <name>@{}",
                request,
                NONE_VERSION
            ),
        };

        let version = (version != NONE_VERSION).then_some(version);
        debug!("Selecting {} = {:?}", name, version);
        manager.select(name, version)?;
        names.push(name);
    }

    finish(manager.commit(&names, cancel).await?)
}
