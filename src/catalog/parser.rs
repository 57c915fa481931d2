use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::package::PackageEntry;
use crate::settings::{ARCHIVE_EXTENSION, DEFAULT_NAMESPACE, DEFAULT_REGISTRY_PREFIX};

/// Absolute http/https/ftp URL: scheme, dotted host, then a path that does not
/// end in punctuation.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:http|ftp|https)://[\w_-]+(?:\.[\w_-]+)+[\w.,@?^=%&:/~+#-]*[\w@?^=%&/~+#-]")
        .expect("link pattern is a valid regex")
});

/// Returns every distinct archive link in `text`, in first-seen order.
pub fn extract_links(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LINK_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|link| link.ends_with(ARCHIVE_EXTENSION))
        .filter(|link| seen.insert(*link))
        .map(String::from)
        .collect()
}

/// Turns catalog page text into package entries.
///
/// Pure: no I/O happens here, the page text is fetched by a
/// [`RegistrySource`](crate::registry::RegistrySource).
#[derive(Debug, Clone)]
pub struct CatalogParser {
    registry_prefix: String,
    namespace: String,
}

impl Default for CatalogParser {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_PREFIX, DEFAULT_NAMESPACE)
    }
}

impl CatalogParser {
    pub fn new(registry_prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            registry_prefix: registry_prefix.into(),
            namespace: namespace.into(),
        }
    }

    /// Parses the page into packages sorted by name, each with its versions
    /// sorted descending. Both orders are plain ordinal string comparisons.
    ///
    /// Any malformed registry link fails the whole parse.
    pub fn parse(&self, text: &str) -> Result<Vec<PackageEntry>> {
        let mut packages: Vec<PackageEntry> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for link in extract_links(text) {
            let Some(name) = self.package_name(&link)? else {
                debug!("Skipping {} (outside the registry)", link);
                continue;
            };

            if !name.starts_with(&self.namespace) {
                debug!("Skipping {} (name outside '{}' namespace)", link, self.namespace);
                continue;
            }

            let version = self.package_version(&link, name)?;

            let index = *by_name.entry(name.to_string()).or_insert_with(|| {
                packages.push(PackageEntry::new(name));
                packages.len() - 1
            });
            packages[index].add_version(version);
        }

        packages.sort_by(|a, b| a.name().cmp(b.name()));
        for package in &mut packages {
            package.normalize_versions();
        }

        debug!("Parsed {} catalog packages", packages.len());
        Ok(packages)
    }

    /// Path segment right after the registry prefix.
    ///
    /// `Ok(None)` for links that are not below the registry prefix.
    fn package_name<'l>(&self, link: &'l str) -> Result<Option<&'l str>> {
        let Some(rest) = link.strip_prefix(&self.registry_prefix) else {
            return Ok(None);
        };

        match rest.find('/') {
            Some(end) => Ok(Some(&rest[..end])),
            None => Err(Error::MalformedCatalogEntry {
                link: link.to_string(),
                reason: "no package directory after the registry prefix".to_string(),
            }),
        }
    }

    /// Remainder of `{name}/{name}-{version}.tgz` after the name and dash.
    fn package_version(&self, link: &str, name: &str) -> Result<String> {
        let malformed = |reason: String| Error::MalformedCatalogEntry {
            link: link.to_string(),
            reason,
        };

        // package_name already matched prefix, name and '/'
        let file_name = &link[self.registry_prefix.len() + name.len() + 1..];

        let version = file_name
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(ARCHIVE_EXTENSION))
            .ok_or_else(|| {
                malformed(format!(
                    "archive name does not match '{}-<version>{}'",
                    name, ARCHIVE_EXTENSION
                ))
            })?;

        if version.is_empty() {
            return Err(malformed("empty version".to_string()));
        }

        Ok(version.to_string())
    }
}
