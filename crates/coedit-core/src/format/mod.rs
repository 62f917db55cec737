//! Document classification by file extension.
//!
//! Everything in this module is a lookup into static tables: adding support
//! for a new extension means adding a row, not changing logic.
//!
//! - [`DocumentKind`]: coarse editor type (text, spreadsheet, presentation)
//! - [`mime_type`]: media type of a file name
//! - [`conversion_target`]: editable format an extension converts to

mod kind;
mod media;
mod target;

use std::path::Path;

pub use kind::{DocumentKind, PRESENTATION_EXTENSIONS, SPREADSHEET_EXTENSIONS, TEXT_EXTENSIONS};
pub use media::{DEFAULT_MIME_TYPE, mime_type, mime_type_for_extension};
pub use target::{conversion_target, is_convertible};

/// Normalizes an extension: trims whitespace, drops a leading dot and
/// lowercases it.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Returns the lowercase extension of a file name, or an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(" .DOCX "), "docx");
        assert_eq!(normalize_extension("xlsx"), "xlsx");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.Final.PPTX"), "pptx");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
    }
}
