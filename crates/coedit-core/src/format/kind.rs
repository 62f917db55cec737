//! Coarse document kinds used to pick the editor type.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::normalize_extension;

/// Extensions opened in the text editor.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "doc", "docx", "docm", "dot", "dotx", "dotm", "odt", "fodt", "ott", "rtf", "txt", "html",
    "htm", "mht", "pdf", "djvu", "fb2", "epub", "xps", "docxf", "oform",
];

/// Extensions opened in the spreadsheet editor.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &[
    "xls", "xlsx", "xlsm", "xlt", "xltx", "xltm", "ods", "fods", "ots", "csv",
];

/// Extensions opened in the presentation editor.
pub const PRESENTATION_EXTENSIONS: &[&str] = &[
    "pps", "ppsx", "ppsm", "ppt", "pptx", "pptm", "pot", "potx", "potm", "odp", "fodp", "otp",
];

/// Document kind derived from a file extension.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Word processing documents
    Text,
    /// Spreadsheets
    Spreadsheet,
    /// Slide decks
    Presentation,
    /// Not an office document
    #[default]
    Unknown,
}

impl DocumentKind {
    /// Classifies an extension, with or without a leading dot.
    pub fn from_extension(ext: &str) -> Self {
        let ext = normalize_extension(ext);

        [Self::Text, Self::Spreadsheet, Self::Presentation]
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
            .unwrap_or_default()
    }

    /// Returns the extension table of this kind.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Text => TEXT_EXTENSIONS,
            Self::Spreadsheet => SPREADSHEET_EXTENSIONS,
            Self::Presentation => PRESENTATION_EXTENSIONS,
            Self::Unknown => &[],
        }
    }

    /// Returns true for every kind the document service can open.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}
