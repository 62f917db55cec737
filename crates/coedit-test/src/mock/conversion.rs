//! Scripted document service doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use coedit_convert::{
    ConversionProvider, ConversionReply, ConversionRequest, ConversionResponse, ConversionService,
    DownloadProvider, DownloadService,
};
use coedit_core::{Error, Result, ServiceHealth};
use url::Url;

#[derive(Debug, Clone)]
enum Reply {
    CompleteAt(Option<Url>),
    InProgress(u8),
    ErrorCode(i32),
}

/// Conversion double that records every request.
///
/// Completes every request by default, with a result URL derived from the
/// revision key and the target extension.
#[derive(Debug, Clone)]
pub struct MockConversionProvider {
    requests: Arc<Mutex<Vec<ConversionRequest>>>,
    reply: Arc<Mutex<Reply>>,
}

impl Default for MockConversionProvider {
    fn default() -> Self {
        Self {
            requests: Arc::default(),
            reply: Arc::new(Mutex::new(Reply::CompleteAt(None))),
        }
    }
}

impl MockConversionProvider {
    /// Base of the result URLs handed out by default.
    pub const RESULT_BASE: &'static str = "https://docs.example.test/cache/";

    /// Creates a double that completes every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a handle to this double into a [`ConversionService`].
    pub fn service(&self) -> ConversionService {
        ConversionService::new(self.clone())
    }

    /// Completes every later request with `file_url`.
    pub fn complete_at(&self, file_url: Url) {
        self.set(Reply::CompleteAt(Some(file_url)));
    }

    /// Answers every later request with an unfinished conversion.
    pub fn in_progress(&self, percent: u8) {
        self.set(Reply::InProgress(percent));
    }

    /// Answers every later request with a document service error code.
    pub fn fail_with_code(&self, code: i32) {
        self.set(Reply::ErrorCode(code));
    }

    /// Returns the default result URL of `request`.
    pub fn result_url(request: &ConversionRequest) -> Url {
        let base = Self::RESULT_BASE;
        let (key, ext) = (&request.revision_key, &request.target_ext);
        let path = format!("{base}{key}.{ext}");
        Url::parse(&path).expect("result base is a valid URL")
    }

    /// Returns how many requests reached the double.
    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Returns the recorded requests, oldest first.
    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set(&self, reply: Reply) {
        *self.reply.lock().unwrap_or_else(|e| e.into_inner()) = reply;
    }
}

#[async_trait::async_trait]
impl ConversionProvider for MockConversionProvider {
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let reply = self.reply.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match reply {
            Reply::CompleteAt(Some(url)) => Ok(ConversionResponse::completed(url)),
            Reply::CompleteAt(None) => Ok(ConversionResponse::completed(Self::result_url(request))),
            Reply::InProgress(percent) => Ok(ConversionResponse::in_progress(percent)),
            Reply::ErrorCode(code) => {
                let reply = ConversionReply {
                    error: Some(code),
                    ..Default::default()
                };
                reply.into_response()
            }
        }
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// Download double serving registered bytes.
///
/// Unregistered URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockDownloadProvider {
    files: Arc<Mutex<HashMap<Url, Bytes>>>,
    statuses: Arc<Mutex<HashMap<Url, u16>>>,
    calls: Arc<Mutex<Vec<(Url, Option<Duration>)>>>,
}

impl MockDownloadProvider {
    /// Creates a double serving nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a handle to this double into a [`DownloadService`].
    pub fn service(&self) -> DownloadService {
        DownloadService::new(self.clone())
    }

    /// Serves `data` at `url`.
    pub fn insert(&self, url: Url, data: impl Into<Bytes>) {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url, data.into());
    }

    /// Answers `url` with an HTTP error status.
    pub fn respond_with_status(&self, url: Url, status: u16) {
        self.statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url, status);
    }

    /// Returns how many downloads were requested.
    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns the timeout of every requested download, oldest first.
    pub fn timeouts(&self) -> Vec<Option<Duration>> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, timeout)| *timeout)
            .collect()
    }
}

#[async_trait::async_trait]
impl DownloadProvider for MockDownloadProvider {
    async fn download(&self, url: &Url, timeout: Option<Duration>) -> Result<Bytes> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.clone(), timeout));

        let status = self
            .statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .copied();
        let data = self
            .files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned();

        match (status, data) {
            (None, Some(data)) => Ok(data),
            (status, _) => {
                let status = status.unwrap_or(404);
                Err(Error::conversion_transport()
                    .with_message(format!("Document service returned status {status}"))
                    .with_context(url.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use coedit_core::RevisionKey;
    use coedit_core::types::ArtifactId;

    use super::*;

    #[tokio::test]
    async fn test_default_reply_is_keyed() {
        let provider = MockConversionProvider::new();
        let key = RevisionKey::derive("5_1_10").unwrap();
        let request = ConversionRequest::new(ArtifactId::new(5), "doc", "docx", key);

        let response = provider.convert(&request).await.unwrap();
        assert_eq!(
            response.file_url.unwrap().as_str(),
            "https://docs.example.test/cache/5_1_10.docx"
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_download_status() {
        let downloads = MockDownloadProvider::new();
        let url = Url::parse("https://docs.example.test/cache/x.docxf").unwrap();
        downloads.insert(url.clone(), "form");

        let data = downloads.download(&url, None).await.unwrap();
        assert_eq!(data.as_ref(), b"form");

        downloads.respond_with_status(url.clone(), 500);
        let error = downloads.download(&url, None).await.unwrap_err();
        assert_eq!(error.kind(), coedit_core::ErrorKind::ConversionTransport);
        assert_eq!(downloads.calls(), 2);
    }
}
