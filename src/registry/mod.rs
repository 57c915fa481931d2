//! Remote catalog and archive source.

use anyhow::Result;
use async_trait::async_trait;

use crate::http::HttpClient;
use crate::settings::{ARCHIVE_EXTENSION, DEFAULT_CATALOG_URL, DEFAULT_REGISTRY_PREFIX};

/// Where the catalog page and package archives come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Raw text of the catalog page.
    async fn fetch_catalog(&self) -> Result<String>;

    /// Raw bytes of one package archive.
    async fn fetch_archive(&self, name: &str, version: &str) -> Result<Vec<u8>>;

    fn catalog_url(&self) -> &str;

    fn archive_url(&self, name: &str, version: &str) -> String;
}

/// The public Google registry (or anything serving the same layout).
pub struct GoogleRegistry {
    http: HttpClient,
    catalog_url: String,
    registry_prefix: String,
}

impl GoogleRegistry {
    #[tracing::instrument(skip(http))]
    pub fn new(http: HttpClient, catalog_url: Option<String>, registry_prefix: Option<String>) -> Self {
        Self {
            http,
            catalog_url: catalog_url.unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            registry_prefix: registry_prefix.unwrap_or_else(|| DEFAULT_REGISTRY_PREFIX.to_string()),
        }
    }
}

#[async_trait]
impl RegistrySource for GoogleRegistry {
    async fn fetch_catalog(&self) -> Result<String> {
        self.http.get_text(&self.catalog_url).await
    }

    async fn fetch_archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        self.http.get_bytes(&self.archive_url(name, version)).await
    }

    fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    fn archive_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}{}/{}-{}{}",
            self.registry_prefix, name, name, version, ARCHIVE_EXTENSION
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    #[test]
    fn test_archive_url_default_prefix() {
        let registry = GoogleRegistry::new(HttpClient::new(Client::new()), None, None);
        assert_eq!(
            registry.archive_url("com.google.play.core", "1.8.0"),
            "https://dl.google.com/games/registry/unity/com.google.play.core/com.google.play.core-1.8.0.tgz"
        );
        assert_eq!(registry.catalog_url(), DEFAULT_CATALOG_URL);
    }

    #[tokio::test]
    async fn test_fetch_catalog_and_archive() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let catalog_mock = server
            .mock("GET", "/unity/archive")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;
        let archive_mock = server
            .mock("GET", "/registry/com.example.pkg/com.example.pkg-1.0.0.tgz")
            .with_status(200)
            .with_body("archive-bytes")
            .create_async()
            .await;

        let registry = GoogleRegistry::new(
            HttpClient::new(Client::new()),
            Some(format!("{}/unity/archive", url)),
            Some(format!("{}/registry/", url)),
        );

        assert_eq!(registry.fetch_catalog().await.unwrap(), "<html></html>");
        assert_eq!(
            registry.fetch_archive("com.example.pkg", "1.0.0").await.unwrap(),
            b"archive-bytes".to_vec()
        );

        catalog_mock.assert_async().await;
        archive_mock.assert_async().await;
    }
}
