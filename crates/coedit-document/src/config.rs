//! Document operation configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use coedit_core::format::normalize_extension;
use coedit_core::types::ArtifactId;
use coedit_core::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default maximum artifact size: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Default timeout for fetching diffs and templates: 30 seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default base URL under which artifact content is published.
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8090/";

/// Configuration of document operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct DocumentConfig {
    /// Maximum artifact size in bytes (0 uses the default of 5 MiB)
    #[cfg_attr(
        feature = "config",
        arg(long, env = "COEDIT_MAX_FILE_SIZE", default_value = "5242880")
    )]
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Extensions opened for editing, `|`-separated
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "COEDIT_EDITED_EXTENSIONS",
            value_delimiter = '|',
            default_value = "docx|xlsx|pptx|docxf"
        )
    )]
    #[serde(default = "default_edited_extensions")]
    pub edited_extensions: Vec<String>,

    /// Extensions opened for form filling, `|`-separated
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "COEDIT_FILLABLE_EXTENSIONS",
            value_delimiter = '|',
            default_value = "oform"
        )
    )]
    #[serde(default = "default_fillable_extensions")]
    pub fillable_extensions: Vec<String>,

    /// Base URL the document service downloads artifact content from
    #[cfg_attr(
        feature = "config",
        arg(long, env = "COEDIT_PUBLIC_URL", default_value = DEFAULT_PUBLIC_URL)
    )]
    #[serde(default = "default_public_url")]
    pub public_url: Url,

    /// Timeout in seconds for fetching diffs and templates
    #[cfg_attr(
        feature = "config",
        arg(long, env = "COEDIT_FETCH_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Locale of demo content for users without one
    #[cfg_attr(
        feature = "config",
        arg(long, env = "COEDIT_DEFAULT_LOCALE", default_value = "en-US")
    )]
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_edited_extensions() -> Vec<String> {
    ["docx", "xlsx", "pptx", "docxf"].map(String::from).to_vec()
}

fn default_fillable_extensions() -> Vec<String> {
    vec!["oform".to_owned()]
}

fn default_public_url() -> Url {
    Url::parse(DEFAULT_PUBLIC_URL).expect("default public URL is valid")
}

fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_locale() -> String {
    coedit_core::content::FALLBACK_LOCALE.to_owned()
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            edited_extensions: default_edited_extensions(),
            fillable_extensions: default_fillable_extensions(),
            public_url: default_public_url(),
            fetch_timeout: default_fetch_timeout(),
            default_locale: default_locale(),
        }
    }
}

impl DocumentConfig {
    /// Returns the maximum artifact size, using the default if zero.
    #[inline]
    pub fn effective_max_file_size(&self) -> u64 {
        if self.max_file_size == 0 {
            DEFAULT_MAX_FILE_SIZE
        } else {
            self.max_file_size
        }
    }

    /// Returns the fetch timeout, using the default if zero.
    pub fn effective_fetch_timeout(&self) -> Duration {
        match self.fetch_timeout {
            0 => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns whether artifacts with this extension open for editing.
    pub fn is_editable(&self, ext: &str) -> bool {
        contains_extension(&self.edited_extensions, ext)
    }

    /// Returns whether artifacts with this extension open for form filling.
    pub fn is_fillable(&self, ext: &str) -> bool {
        contains_extension(&self.fillable_extensions, ext)
    }

    /// Returns the URL the document service fetches an artifact's latest
    /// content from: `{public_url}/artifacts/{id}/content`.
    pub fn download_url(&self, artifact_id: ArtifactId) -> Result<Url> {
        let mut url = self.public_url.clone();
        let Ok(mut segments) = url.path_segments_mut() else {
            return Err(Error::configuration()
                .with_message("public URL cannot be a base")
                .with_context(self.public_url.to_string()));
        };

        let id = artifact_id.to_string();
        segments.pop_if_empty();
        segments.extend(["artifacts", &id, "content"]);
        drop(segments);
        Ok(url)
    }

    /// Set the maximum artifact size in bytes.
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set the public base URL.
    pub fn with_public_url(mut self, public_url: Url) -> Self {
        self.public_url = public_url;
        self
    }

    /// Set the fetch timeout in seconds.
    pub fn with_fetch_timeout(mut self, timeout_secs: u64) -> Self {
        self.fetch_timeout = timeout_secs;
        self
    }

    /// Set the default demo content locale.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }
}

fn contains_extension(list: &[String], ext: &str) -> bool {
    let ext = normalize_extension(ext);
    let matches = |candidate: &String| normalize_extension(candidate) == ext;
    list.iter().any(matches)
}
