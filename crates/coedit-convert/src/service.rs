//! Conversion and download service wrappers with observability.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use url::Url;

use crate::{
    ConversionProvider, ConversionRequest, ConversionResponse, DownloadProvider, Error, Result,
    ServiceHealth, TRACING_TARGET,
};

/// Conversion service wrapper with observability.
///
/// Same-format requests are answered locally with the source URL and never
/// reach the provider.
#[derive(Clone)]
pub struct ConversionService {
    inner: Arc<dyn ConversionProvider>,
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionService").finish_non_exhaustive()
    }
}

impl ConversionService {
    /// Create a new conversion service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: ConversionProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Submits a conversion request.
    pub async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse> {
        if request.is_identity() {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %request.request_id,
                artifact_id = %request.artifact_id,
                format = %request.target_ext,
                "Skipping same-format conversion"
            );

            return Ok(ConversionResponse::identity(request.source_url.clone()));
        }

        if request.source_url.is_none() {
            return Err(Error::invalid_argument()
                .with_message("conversion requires a source URL")
                .with_context(format!("artifact {}", request.artifact_id)));
        }

        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            artifact_id = %request.artifact_id,
            revision_key = %request.revision_key,
            source_ext = %request.source_ext,
            target_ext = %request.target_ext,
            is_async = request.is_async,
            "Requesting conversion"
        );

        let result = self.inner.convert(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(response) if response.is_complete() => {
                tracing::info!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    artifact_id = %request.artifact_id,
                    elapsed_ms = elapsed.as_millis(),
                    "Conversion completed"
                );
            }
            Ok(response) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    percent = response.percent,
                    elapsed_ms = elapsed.as_millis(),
                    "Conversion in progress"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id,
                    artifact_id = %request.artifact_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Conversion failed"
                );
            }
        }

        result
    }

    /// Performs a health check on the document service.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}

/// Download service wrapper with observability.
#[derive(Clone)]
pub struct DownloadService {
    inner: Arc<dyn DownloadProvider>,
}

impl fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadService").finish_non_exhaustive()
    }
}

impl DownloadService {
    /// Create a new download service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: DownloadProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Downloads the bytes behind `url`.
    pub async fn download(&self, url: &Url, timeout: Option<Duration>) -> Result<Bytes> {
        let started_at = Instant::now();
        let result = self.inner.download(url, timeout).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(data) => tracing::debug!(
                target: TRACING_TARGET,
                url = %url,
                size = data.len(),
                elapsed_ms = elapsed.as_millis(),
                "Download completed"
            ),
            Err(error) => tracing::warn!(
                target: TRACING_TARGET,
                url = %url,
                error = %error,
                elapsed_ms = elapsed.as_millis(),
                "Download failed"
            ),
        }

        result
    }
}
