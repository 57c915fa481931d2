use anyhow::Result;
use log::debug;
use reqwest::Client;

use std::path::PathBuf;

use crate::{
    http::HttpClient,
    registry::{GoogleRegistry, RegistrySource},
    runtime::Runtime,
    settings::Settings,
};

pub struct Config<R: Runtime, S: RegistrySource> {
    pub runtime: R,
    pub registry: S,
    pub settings: Settings,
}

impl<R: Runtime> Config<R, GoogleRegistry> {
    /// Builds the CLI configuration. The project root defaults to the current
    /// directory; URL overrides fall back to the public registry.
    pub fn new(
        runtime: R,
        project: Option<PathBuf>,
        catalog_url: Option<String>,
        registry_url: Option<String>,
    ) -> Result<Self> {
        let project_root = match project {
            Some(path) => path,
            None => runtime.current_dir()?,
        };
        debug!("Using project root: {:?}", project_root);

        let settings = Settings::new(project_root)
            .with_catalog_url(catalog_url)
            .with_registry_prefix(registry_url);

        let client = Client::builder().user_agent("gupm-cli").build()?;
        let registry = GoogleRegistry::new(
            HttpClient::new(client),
            Some(settings.catalog_url.clone()),
            Some(settings.registry_prefix.clone()),
        );

        Ok(Self {
            runtime,
            registry,
            settings,
        })
    }
}
