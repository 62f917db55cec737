#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use std::time::Duration;

use bytes::Bytes;
use url::Url;

mod job;
mod service;

pub mod request;
pub mod response;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use coedit_core::{Error, ErrorKind, Result, ServiceHealth, ServiceStatus};
pub use job::{ConversionJob, ConversionState, PollPolicy};
pub use request::{ConversionPayload, ConversionRequest};
pub use response::{ConversionReply, ConversionResponse, describe_error_code};
pub use service::{ConversionService, DownloadService};

/// Tracing target for conversion operations.
pub const TRACING_TARGET: &str = "coedit_convert";

/// Remote document service that converts documents between formats.
///
/// Implement this trait to plug in a different transport or a test double.
#[async_trait::async_trait]
pub trait ConversionProvider: Send + Sync {
    /// Submits a conversion request and returns the service's reply.
    async fn convert(&self, request: &ConversionRequest) -> Result<ConversionResponse>;

    /// Performs a health check on the document service.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Fetches converted documents from the URLs handed out by the document
/// service.
#[async_trait::async_trait]
pub trait DownloadProvider: Send + Sync {
    /// Downloads the bytes behind `url`.
    ///
    /// Any non-2xx status is reported as
    /// [`ErrorKind::ConversionTransport`].
    async fn download(&self, url: &Url, timeout: Option<Duration>) -> Result<Bytes>;
}
