//! Reqwest-based HTTP client for the document service.
//!
//! This module provides a reqwest-based implementation of the
//! [`ConversionProvider`](crate::ConversionProvider) and
//! [`DownloadProvider`](crate::DownloadProvider) traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use coedit_convert::reqwest::{ReqwestClient, ReqwestConfig};
//! use coedit_convert::ConversionService;
//!
//! let client = ReqwestClient::new(ReqwestConfig::default())?;
//! let service: ConversionService = client.into_service();
//! ```

mod client;
mod config;
mod error;

pub use client::ReqwestClient;
pub use config::{DEFAULT_CONVERSION_URL, DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "coedit_convert::reqwest";
