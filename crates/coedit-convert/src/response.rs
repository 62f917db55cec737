//! Conversion reply types.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Outcome of a conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResponse {
    /// Where the converted document can be fetched, once finished.
    pub file_url: Option<Url>,
    /// Whether the conversion has finished.
    pub end_convert: bool,
    /// Conversion progress, 0 to 100.
    pub percent: u8,
}

impl ConversionResponse {
    /// A finished conversion whose result lives at `file_url`.
    pub fn completed(file_url: Url) -> Self {
        Self {
            file_url: Some(file_url),
            end_convert: true,
            percent: 100,
        }
    }

    /// A conversion that is still running.
    pub fn in_progress(percent: u8) -> Self {
        Self {
            file_url: None,
            end_convert: false,
            percent: percent.min(99),
        }
    }

    /// The reply of a same-format conversion: the source itself.
    pub fn identity(source_url: Option<Url>) -> Self {
        Self {
            file_url: source_url,
            end_convert: true,
            percent: 100,
        }
    }

    /// Returns whether the conversion has finished.
    pub fn is_complete(&self) -> bool {
        self.end_convert
    }

    /// Returns the result URL of a finished conversion.
    pub fn into_file_url(self) -> Result<Url> {
        if !self.end_convert {
            return Err(Error::conversion_transport()
                .with_message("conversion has not finished")
                .with_context(format!("{}%", self.percent)));
        }

        self.file_url.ok_or_else(|| {
            Error::conversion_transport().with_message("conversion finished without a result URL")
        })
    }
}

/// JSON body returned by the document service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReply {
    /// Result location, present once the conversion has finished.
    #[serde(default)]
    pub file_url: Option<String>,
    /// Whether the conversion has finished.
    #[serde(default)]
    pub end_convert: Option<bool>,
    /// Conversion progress reported by the service.
    #[serde(default)]
    pub percent: Option<u8>,
    /// Service error code, see [`describe_error_code`].
    #[serde(default)]
    pub error: Option<i32>,
}

impl ConversionReply {
    /// Interprets the reply.
    ///
    /// An `error` member is reported as
    /// [`ErrorKind::ConversionTransport`](crate::ErrorKind::ConversionTransport)
    /// carrying the code's description.
    pub fn into_response(self) -> Result<ConversionResponse> {
        if let Some(code) = self.error {
            return Err(Error::conversion_transport()
                .with_message(describe_error_code(code))
                .with_context(format!("error code {code}")));
        }

        if !self.end_convert.unwrap_or(false) {
            return Ok(ConversionResponse::in_progress(self.percent.unwrap_or(0)));
        }

        let file_url = self.file_url.ok_or_else(|| {
            Error::serialization().with_message("finished conversion reply has no fileUrl")
        })?;
        let file_url = Url::parse(&file_url).map_err(|e| {
            Error::serialization()
                .with_message("fileUrl is not a valid URL")
                .with_source(e)
        })?;

        Ok(ConversionResponse::completed(file_url))
    }
}

/// Describes an error code of the document service.
pub fn describe_error_code(code: i32) -> &'static str {
    match code {
        -1 => "Unknown error",
        -2 => "Conversion timeout",
        -3 => "Conversion failed",
        -4 => "Document service could not download the source document",
        -5 => "Document is password protected",
        -6 => "Conversion result storage is unavailable",
        -7 => "Invalid conversion input",
        -8 => "Invalid token",
        _ => "Unrecognized error code",
    }
}
