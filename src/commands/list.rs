use anyhow::Result;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{
    controller::PackageManager, package::PackageEntry, registry::RegistrySource,
    runtime::Runtime,
};

use super::config::Config;

/// List catalog packages with the version the project currently uses
#[tracing::instrument(skip(config, cancel))]
pub async fn list<R: Runtime, S: RegistrySource>(
    config: Config<R, S>,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let Config {
        runtime,
        registry,
        settings,
    } = config;
    debug!("Listing packages for {:?}", settings.project_root);

    let manager = PackageManager::new(&runtime, registry, &settings);
    let packages = manager.refresh(cancel).await?;

    println!("{}", render(&packages, json)?);
    Ok(())
}

fn render(packages: &[PackageEntry], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(packages)?);
    }

    if packages.is_empty() {
        return Ok("No packages in catalog.".to_string());
    }

    let width = packages.iter().map(|p| p.name().len()).max().unwrap_or(0);
    let lines: Vec<String> = packages
        .iter()
        .map(|p| {
            format!(
                "{:<width$}  {:<12}  latest {}",
                p.name(),
                p.installed.as_deref().unwrap_or("-"),
                p.latest().unwrap_or("-"),
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MockRegistrySource;
    use crate::runtime::RealRuntime;
    use crate::settings::Settings;

    fn entry(name: &str, versions: &[&str], installed: Option<&str>) -> PackageEntry {
        let mut entry = PackageEntry::new(name);
        for version in versions {
            entry.add_version(*version);
        }
        entry.installed = installed.map(String::from);
        entry.selected = entry.installed.clone();
        entry
    }

    #[test]
    fn test_render_table() {
        let packages = vec![
            entry("com.google.firebase.app", &["9.6.0"], Some("9.6.0")),
            entry("com.google.play.core", &["1.8.0"], None),
        ];

        let text = render(&packages, false).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("com.google.firebase.app  9.6.0"));
        assert!(lines[1].starts_with("com.google.play.core     -"));
        assert!(lines[1].ends_with("latest 1.8.0"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], false).unwrap(), "No packages in catalog.");
        assert_eq!(render(&[], true).unwrap(), "[]");
    }

    #[test]
    fn test_render_json() {
        let packages = vec![entry("com.a", &["1.0.0"], Some("1.0.0"))];
        let value: serde_json::Value =
            serde_json::from_str(&render(&packages, true).unwrap()).unwrap();

        assert_eq!(value[0]["name"], "com.a");
        assert_eq!(value[0]["versions"][0], "1.0.0");
        assert_eq!(value[0]["installed"], "1.0.0");
    }

    #[tokio::test]
    async fn test_list_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = MockRegistrySource::new();
        registry
            .expect_catalog_url()
            .return_const("https://example.com/archive".to_string());
        registry
            .expect_fetch_catalog()
            .returning(|| Ok(String::new()));

        let config = Config {
            runtime: RealRuntime,
            registry,
            settings: Settings::new(dir.path()),
        };

        let err = list(config, false, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Manifest not found"));
    }
}
