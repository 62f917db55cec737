//! Conversion request and wire payload types.

use std::time::Duration;

use coedit_core::RevisionKey;
use coedit_core::format::normalize_extension;
use coedit_core::types::ArtifactId;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A request to convert one artifact version into another format.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// Artifact whose bytes are converted.
    pub artifact_id: ArtifactId,
    /// Normalized extension of the source document.
    pub source_ext: String,
    /// Normalized extension of the produced document.
    pub target_ext: String,
    /// Revision key of the source version.
    pub revision_key: RevisionKey,
    /// URL the document service fetches the source bytes from.
    pub source_url: Option<Url>,
    /// Document title reported to the document service.
    pub title: Option<String>,
    /// Whether the service should reply before the conversion finishes.
    pub is_async: bool,
    /// Optional request timeout (uses client default if not set).
    pub timeout: Option<Duration>,
}

impl ConversionRequest {
    /// Creates a new synchronous conversion request.
    pub fn new(
        artifact_id: ArtifactId,
        source_ext: &str,
        target_ext: &str,
        revision_key: RevisionKey,
    ) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            artifact_id,
            source_ext: normalize_extension(source_ext),
            target_ext: normalize_extension(target_ext),
            revision_key,
            source_url: None,
            title: None,
            is_async: false,
            timeout: None,
        }
    }

    /// Sets the URL of the source bytes.
    #[must_use]
    pub fn with_source_url(mut self, source_url: Url) -> Self {
        self.source_url = Some(source_url);
        self
    }

    /// Sets the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Requests an asynchronous conversion.
    #[must_use]
    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns whether source and target formats are the same.
    pub fn is_identity(&self) -> bool {
        self.source_ext == self.target_ext
    }

    /// Builds the JSON body sent to the document service.
    pub fn to_payload(&self) -> ConversionPayload {
        ConversionPayload {
            is_async: self.is_async,
            file_type: self.source_ext.clone(),
            output_type: self.target_ext.clone(),
            key: self.revision_key.clone(),
            title: self.title.clone(),
            url: self.source_url.clone(),
        }
    }
}

/// JSON body of a conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPayload {
    /// Whether the service may reply before the conversion finishes.
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Extension of the source document.
    #[serde(rename = "filetype")]
    pub file_type: String,
    /// Extension of the produced document.
    #[serde(rename = "outputtype")]
    pub output_type: String,
    /// Revision key of the source version.
    pub key: RevisionKey,
    /// Document title shown by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Where the service fetches the source bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
}
