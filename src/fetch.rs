//! Registry data providers.
//!
//! A [`Provider`] turns a registry source into raw delegation text, or an
//! explicit "unavailable" signal. Retry and transport policy live here; the
//! index pipeline never sees a transport error, only `Ok(None)`.

use std::path::PathBuf;
use std::time::Duration;

use log::{info, warn};

use crate::config::{DOWNLOAD_TIMEOUT_SECS, RETRY_MAX_ATTEMPTS};
use crate::error_handling::{get_retry_strategy, FetchError};
use crate::registry::{Registry, RegistrySource, SourceLocation};

/// Supplies raw delegation text for one registry source.
pub trait Provider {
    /// `None` means the registry is unavailable after the provider's own
    /// retry policy; the build skips it and continues.
    fn fetch(
        &self,
        source: &RegistrySource,
    ) -> impl std::future::Future<Output = Option<String>> + Send;
}

/// Downloads `delegated-<rir>-extended-latest` files over HTTP with
/// exponential-backoff retries. Falls back to local files when a source
/// points at one.
pub struct HttpProvider {
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new() -> Result<HttpProvider, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(HttpProvider { client })
    }

    async fn download(&self, registry: Registry, url: &str) -> Result<String, FetchError> {
        info!("Downloading {} data from {}", registry, url);
        let retry_strategy = get_retry_strategy().take(RETRY_MAX_ATTEMPTS - 1);

        let body = tokio_retry::Retry::spawn(retry_strategy, || async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.text().await
        })
        .await?;

        Ok(body)
    }
}

impl Provider for HttpProvider {
    async fn fetch(&self, source: &RegistrySource) -> Option<String> {
        let result = match &source.location {
            SourceLocation::Url(url) => self.download(source.registry, url).await,
            SourceLocation::File(path) => read_file(path).await,
        };
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(
                    "Failed to obtain {} data after {} attempts: {}",
                    source.registry, RETRY_MAX_ATTEMPTS, e
                );
                None
            }
        }
    }
}

/// Reads delegation files from a local directory. Used by `build --from-dir`
/// and by tests.
pub struct DirProvider;

impl Provider for DirProvider {
    async fn fetch(&self, source: &RegistrySource) -> Option<String> {
        let result = match &source.location {
            SourceLocation::File(path) => read_file(path).await,
            SourceLocation::Url(url) => {
                warn!("DirProvider cannot fetch URL source {}", url);
                return None;
            }
        };
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to read {} data: {}", source.registry, e);
                None
            }
        }
    }
}

async fn read_file(path: &PathBuf) -> Result<String, FetchError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::IoError {
            path: path.display().to_string(),
            source,
        })
}
