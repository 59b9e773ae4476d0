//! Fetching and parsing of remote USDL documents.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use oxigraph::io::RdfFormat;
use reqwest::header::CONTENT_TYPE;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use url::Url;

use super::model::{RdfError, RdfModel};
use crate::config::FetchConfig;

/// Loads the RDF document behind a description URL.
///
/// `Ok(None)` means the document could not be retrieved (unreachable host,
/// error status, unsupported scheme). A retrieved document that is not valid
/// RDF is an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Option<RdfModel>, RdfError>;
}

/// [`ModelLoader`] for `http(s)://` and `file://` URLs.
pub struct HttpModelLoader {
    client: reqwest::Client,
    retries: usize,
}

impl HttpModelLoader {
    /// Builds the HTTP client from the fetch settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            retries: config.retries,
        })
    }

    async fn fetch_http(&self, url: &Url) -> Option<(Vec<u8>, Option<String>)> {
        let strategy = ExponentialBackoff::from_millis(10)
            .factor(20)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.retries);

        let response = match Retry::spawn(strategy, || self.client.get(url.as_str()).send()).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Description document is unreachable");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Description document request failed");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.bytes().await {
            Ok(body) => Some((body.to_vec(), content_type)),
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read description document body");
                None
            }
        }
    }

    async fn read_file(url: &Url) -> Option<Vec<u8>> {
        let Ok(path) = url.to_file_path() else {
            warn!(url = %url, "Invalid file URL");
            return None;
        };

        match tokio::fs::read(&path).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read description document");
                None
            }
        }
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn load(&self, url: &str) -> Result<Option<RdfModel>, RdfError> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(url, error = %e, "Description URL is not valid");
                return Ok(None);
            }
        };

        let (data, content_type) = match parsed.scheme() {
            "http" | "https" => match self.fetch_http(&parsed).await {
                Some(fetched) => fetched,
                None => return Ok(None),
            },
            "file" => match Self::read_file(&parsed).await {
                Some(data) => (data, None),
                None => return Ok(None),
            },
            scheme => {
                warn!(url, scheme, "Unsupported description URL scheme");
                return Ok(None);
            }
        };

        let format = detect_format(content_type.as_deref(), parsed.path());
        debug!(url, bytes = data.len(), format = ?format, "Parsing description document");

        RdfModel::parse(&data, format, Some(url)).map(Some)
    }
}

/// Media types generic file servers send for any document.
const GENERIC_MEDIA_TYPES: &[&str] = &["text/plain", "application/octet-stream"];

/// Picks the RDF syntax from the media type, then the file extension.
///
/// Generic media types are ignored. Falls back to RDF/XML, the usual USDL
/// serialization.
pub fn detect_format(content_type: Option<&str>, path: &str) -> RdfFormat {
    let from_media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|media_type| {
            !GENERIC_MEDIA_TYPES
                .iter()
                .any(|generic| media_type.eq_ignore_ascii_case(generic))
        })
        .and_then(RdfFormat::from_media_type);

    from_media_type
        .or_else(|| {
            Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(RdfFormat::from_extension)
        })
        .unwrap_or(RdfFormat::RdfXml)
}
