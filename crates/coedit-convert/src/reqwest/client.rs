//! Reqwest-based HTTP client for the document service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::ACCEPT;
use url::Url;

use super::{Error, ReqwestConfig, TRACING_TARGET};
use crate::{
    ConversionProvider, ConversionReply, ConversionRequest, ConversionResponse, ConversionService,
    DownloadProvider, DownloadService, ServiceHealth,
};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based HTTP client for the document service.
///
/// Implements [`ConversionProvider`] against the converter endpoint and
/// [`DownloadProvider`] for fetching results.
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> crate::Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            conversion_url = %config.conversion_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                crate::Error::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(e)
            })?;

        Ok(Self {
            inner: Arc::new(ReqwestClientInner { http, config }),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`ConversionService`].
    pub fn into_service(self) -> ConversionService {
        ConversionService::new(self)
    }

    /// Converts this client into a [`DownloadService`].
    pub fn into_download_service(self) -> DownloadService {
        DownloadService::new(self)
    }
}

#[async_trait::async_trait]
impl ConversionProvider for ReqwestClient {
    async fn convert(&self, request: &ConversionRequest) -> crate::Result<ConversionResponse> {
        let url = &self.config().conversion_url;
        let timeout = request
            .timeout
            .unwrap_or_else(|| self.config().effective_timeout());

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            url = %url,
            "Posting conversion request"
        );

        let response = self
            .http()
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .json(&request.to_payload())
            .timeout(timeout)
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(Error::from)?;
        let reply: ConversionReply = serde_json::from_slice(&body).map_err(Error::from)?;

        let revision = format!("revision {}", request.revision_key);
        reply.into_response().map_err(|e| e.with_context(revision))
    }

    async fn health_check(&self) -> crate::Result<ServiceHealth> {
        let url = self.config().effective_health_url().map_err(|e| {
            crate::Error::configuration()
                .with_message("invalid health check URL")
                .with_source(e)
        })?;

        let started_at = Instant::now();
        let response = match self.http().get(url.clone()).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    url = %url,
                    error = %error,
                    "Document service unreachable"
                );
                return Ok(ServiceHealth::unhealthy(error.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    url = %url,
                    error = %error,
                    "Unreadable health check response"
                );
                let health = ServiceHealth::unhealthy(error.to_string());
                return Ok(health.with_response_time(started_at.elapsed()));
            }
        };
        let elapsed = started_at.elapsed();

        let health = if status.is_success() && body.trim() == "true" {
            ServiceHealth::healthy()
        } else {
            ServiceHealth::unhealthy(format!("health check answered {status}"))
        };

        Ok(health.with_response_time(elapsed))
    }
}

#[async_trait::async_trait]
impl DownloadProvider for ReqwestClient {
    async fn download(&self, url: &Url, timeout: Option<Duration>) -> crate::Result<Bytes> {
        let timeout = timeout.unwrap_or_else(|| self.config().effective_timeout());

        let response = self
            .http()
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(Error::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        Ok(response.bytes().await.map_err(Error::from)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use coedit_core::RevisionKey;
    use coedit_core::types::ArtifactId;
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::{ErrorKind, ServiceStatus};

    fn client(server: &mockito::ServerGuard) -> ReqwestClient {
        let url = Url::parse(&format!("{}/converter", server.url())).unwrap();
        ReqwestClient::new(ReqwestConfig::new(url)).unwrap()
    }

    fn request() -> ConversionRequest {
        let source = Url::parse("https://wiki.example.com/artifacts/21/content").unwrap();
        let key = RevisionKey::derive("21_1_4096").unwrap();

        ConversionRequest::new(ArtifactId::new(21), "docx", "docxf", key)
            .with_source_url(source)
            .with_title("Template.docx")
    }

    #[tokio::test]
    async fn test_convert_posts_payload() {
        let reply = json!({
            "fileUrl": "https://docs.example.com/cache/21.docxf",
            "endConvert": true,
            "percent": 100,
        });

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/converter")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "async": false,
                "filetype": "docx",
                "outputtype": "docxf",
                "key": "21_1_4096",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply.to_string())
            .create_async()
            .await;

        let response = client(&server).convert(&request()).await.unwrap();
        mock.assert_async().await;

        assert!(response.is_complete());
        assert_eq!(
            response.file_url.unwrap().as_str(),
            "https://docs.example.com/cache/21.docxf"
        );
    }

    #[tokio::test]
    async fn test_convert_reports_service_error_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/converter")
            .with_status(200)
            .with_body(r#"{"error":-3}"#)
            .create_async()
            .await;

        let error = client(&server).convert(&request()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ConversionTransport);
        assert_eq!(error.message.as_deref(), Some("Conversion failed"));
    }

    #[tokio::test]
    async fn test_convert_rejects_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/converter")
            .with_status(503)
            .create_async()
            .await;

        let error = client(&server).convert(&request()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ConversionTransport);
    }

    #[tokio::test]
    async fn test_convert_rejects_garbage_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/converter")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let error = client(&server).convert(&request()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Serialization);
    }

    #[tokio::test]
    async fn test_download() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cache/21.docxf")
            .with_status(200)
            .with_body(b"PK\x03\x04form")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/cache/21.docxf", server.url())).unwrap();
        let data = client(&server).download(&url, None).await.unwrap();
        mock.assert_async().await;

        assert_eq!(data.as_ref(), b"PK\x03\x04form");
    }

    #[tokio::test]
    async fn test_download_rejects_non_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/cache/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/cache/missing", server.url())).unwrap();
        let error = client(&server).download(&url, None).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ConversionTransport);
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthcheck")
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let health = client(&server).health_check().await.unwrap();
        assert_eq!(health.status, ServiceStatus::Healthy);
        assert!(health.response.is_some());
    }

    #[tokio::test]
    async fn test_health_check_unhealthy() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthcheck")
            .with_status(200)
            .with_body("false")
            .create_async()
            .await;

        let health = client(&server).health_check().await.unwrap();
        assert_eq!(health.status, ServiceStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_health_check_broken_body_is_unhealthy() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/healthcheck")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"tr")?;
                Err(std::io::Error::other("connection reset"))
            })
            .create_async()
            .await;

        let health = client(&server).health_check().await.unwrap();
        assert_eq!(health.status, ServiceStatus::Unhealthy);
        assert!(health.message.is_some());
        assert!(health.response.is_some());
    }
}
