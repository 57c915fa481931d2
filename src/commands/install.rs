use anyhow::{Result, anyhow};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{controller::PackageManager, registry::RegistrySource, runtime::Runtime};

use super::{config::Config, finish, parse_request, progress_printer};

/// Install a package, or switch it to another version. Without `@version` the
/// newest catalog version is used.
#[tracing::instrument(skip(config, cancel))]
pub async fn install<R: Runtime, S: RegistrySource>(
    config: Config<R, S>,
    spec: &str,
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

    let (name, version) = parse_request(spec);
    let version = match version {
        Some(version) => version.to_string(),
        None => {
            let package = manager.package(name)?;
            package
                .latest()
                .map(String::from)
                .ok_or_else(|| anyhow!("Package '{}' has no versions", name))?
        }
    };
    debug!("Installing {} at {}", name, version);

    manager.select(name, Some(version.as_str()))?;
    finish(manager.commit(&[name], cancel).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MockRegistrySource;
    use crate::runtime::RealRuntime;
    use crate::settings::{DEFAULT_REGISTRY_PREFIX, Settings};
    use mockall::predicate::eq;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Packages")).unwrap();
        std::fs::write(
            dir.path().join("Packages/manifest.json"),
            "{\n  \"dependencies\": {}\n}",
        )
        .unwrap();
        dir
    }

    fn registry() -> MockRegistrySource {
        let page = ["1.0.0", "1.1.0"]
            .iter()
            .map(|v| format!("<a href=\"{DEFAULT_REGISTRY_PREFIX}com.a/com.a-{v}.tgz\">a</a>\n"))
            .collect::<String>();

        let mut registry = MockRegistrySource::new();
        registry
            .expect_catalog_url()
            .return_const("https://example.com/archive".to_string());
        registry
            .expect_fetch_catalog()
            .returning(move || Ok(page.clone()));
        registry
    }

    fn manifest(dir: &tempfile::TempDir) -> serde_json::Value {
        let text = std::fs::read_to_string(dir.path().join("Packages/manifest.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_install_defaults_to_latest() {
        let dir = project();
        let mut registry = registry();
        registry
            .expect_fetch_archive()
            .with(eq("com.a"), eq("1.1.0"))
            .times(1)
            .returning(|_, _| Ok(b"tgz".to_vec()));

        let config = Config {
            runtime: RealRuntime,
            registry,
            settings: Settings::new(dir.path()),
        };
        install(config, "com.a", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            manifest(&dir)["dependencies"]["com.a"],
            "file:../GooglePackages/com.a-1.1.0.tgz"
        );
        assert!(dir.path().join("GooglePackages/com.a-1.1.0.tgz").exists());
    }

    #[tokio::test]
    async fn test_install_explicit_version() {
        let dir = project();
        let mut registry = registry();
        registry
            .expect_fetch_archive()
            .with(eq("com.a"), eq("1.0.0"))
            .times(1)
            .returning(|_, _| Ok(b"tgz".to_vec()));

        let config = Config {
            runtime: RealRuntime,
            registry,
            settings: Settings::new(dir.path()),
        };
        install(config, "com.a@1.0.0", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            manifest(&dir)["dependencies"]["com.a"],
            "file:../GooglePackages/com.a-1.0.0.tgz"
        );
    }

    #[tokio::test]
    async fn test_install_unknown_version_fails() {
        let dir = project();
        let mut registry = registry();
        registry.expect_fetch_archive().never();

        let config = Config {
            runtime: RealRuntime,
            registry,
            settings: Settings::new(dir.path()),
        };
        let err = install(config, "com.a@9.9.9", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no version '9.9.9'"));
        assert!(manifest(&dir)["dependencies"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_install_download_failure_is_reported() {
        let dir = project();
        let mut registry = registry();
        registry
            .expect_fetch_archive()
            .returning(|_, _| Err(anyhow::anyhow!("HTTP 503")));
        registry
            .expect_archive_url()
            .returning(|name, version| format!("https://example.com/{name}-{version}.tgz"));

        let config = Config {
            runtime: RealRuntime,
            registry,
            settings: Settings::new(dir.path()),
        };
        let err = install(config, "com.a", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("HTTP 503"));
        assert!(!dir.path().join("GooglePackages/com.a-1.1.0.tgz").exists());
    }
}
