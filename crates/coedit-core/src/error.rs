//! Structured error handling shared by every coedit crate.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source error of [`Error`], so network and storage failures
/// keep their original cause while being classified by [`ErrorKind`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in coedit operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsRefStr, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, e.g. an empty fingerprint.
    InvalidArgument,
    /// The artifact format is not accepted by the requested flow.
    UnsupportedFormat,
    /// The permission check failed or the principal is anonymous.
    AccessDenied,
    /// Referenced artifact or container is absent.
    NotFound,
    /// Non-2xx status or network failure talking to the external service.
    ConversionTransport,
    /// Transaction or persistence failure reported by storage.
    Storage,
    /// Configuration error.
    Configuration,
    /// Serialization/deserialization error.
    Serialization,
    /// Internal error.
    #[default]
    Internal,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConversionTransport)
    }

    /// Check if this error kind describes bad caller input.
    ///
    /// [`ErrorKind::UnsupportedFormat`] is the flavour of invalid argument
    /// raised when a flow requires one specific source format.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument | Self::UnsupportedFormat)
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error(
    "[{kind}]{}{}",
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default(),
    context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default()
)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Which operation and artifact the error belongs to.
    pub context: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
            context: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument() -> Self {
        Self::new(ErrorKind::InvalidArgument)
    }

    /// Creates a new unsupported format error.
    pub fn unsupported_format() -> Self {
        Self::new(ErrorKind::UnsupportedFormat)
    }

    /// Creates a new access denied error.
    pub fn access_denied() -> Self {
        Self::new(ErrorKind::AccessDenied)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a new conversion transport error.
    pub fn conversion_transport() -> Self {
        Self::new(ErrorKind::ConversionTransport)
    }

    /// Creates a new storage error.
    pub fn storage() -> Self {
        Self::new(ErrorKind::Storage)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Creates a new internal error.
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Check if this error was caused by bad caller input.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        self.kind.is_invalid_argument()
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("Invalid JSON payload")
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::from_source(ErrorKind::Serialization, error).with_message("Invalid UTF-8 encoding")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::Internal);
        assert_eq!(error.kind, ErrorKind::Internal);
        assert!(error.message.is_none());
        assert!(error.source.is_none());
        assert!(error.context.is_none());
    }

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::storage()
            .with_message("commit failed")
            .with_context("create_artifact, artifact 7");

        assert_eq!(error.kind, ErrorKind::Storage);
        assert_eq!(error.message.as_deref(), Some("commit failed"));
        assert_eq!(
            error.context.as_deref(),
            Some("create_artifact, artifact 7")
        );
    }

    #[test]
    fn test_error_display() {
        let error = Error::access_denied()
            .with_message("cannot edit")
            .with_context("artifact 3");

        let display_str = error.to_string();
        assert!(display_str.contains("access_denied"));
        assert!(display_str.contains("cannot edit"));
        assert!(display_str.contains("artifact 3"));
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = Error::from(json_error);

        assert_eq!(error.kind, ErrorKind::Serialization);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::conversion_transport().is_retryable());
        assert!(!Error::storage().is_retryable());
        assert!(!Error::access_denied().is_retryable());
    }

    #[test]
    fn test_unsupported_format_is_invalid_argument() {
        assert!(ErrorKind::UnsupportedFormat.is_invalid_argument());
        assert!(ErrorKind::InvalidArgument.is_invalid_argument());
        assert!(!ErrorKind::NotFound.is_invalid_argument());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("not_found").unwrap(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::from_str("conversion_transport").unwrap(),
            ErrorKind::ConversionTransport
        );
        assert!(ErrorKind::from_str("invalid").is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(ErrorKind::default(), ErrorKind::Internal);
    }
}
