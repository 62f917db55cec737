//! Media types of office document extensions.

use super::{extension_of, normalize_extension};

/// Media type used when an extension is not in the table.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension to media type table.
const MIME_TYPES: &[(&str, &str)] = &[
    // Text documents
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("docm", "application/vnd.ms-word.document.macroEnabled.12"),
    ("dot", "application/msword"),
    (
        "dotx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template",
    ),
    ("dotm", "application/vnd.ms-word.template.macroEnabled.12"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("fodt", "application/vnd.oasis.opendocument.text-flat-xml"),
    ("ott", "application/vnd.oasis.opendocument.text-template"),
    ("rtf", "application/rtf"),
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("mht", "message/rfc822"),
    ("pdf", "application/pdf"),
    ("djvu", "image/vnd.djvu"),
    ("fb2", "application/x-fictionbook+xml"),
    ("epub", "application/epub+zip"),
    ("xps", "application/vnd.ms-xpsdocument"),
    (
        "docxf",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.docxf",
    ),
    (
        "oform",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.oform",
    ),
    // Spreadsheets
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xlsm", "application/vnd.ms-excel.sheet.macroEnabled.12"),
    ("xlt", "application/vnd.ms-excel"),
    (
        "xltx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.template",
    ),
    ("xltm", "application/vnd.ms-excel.template.macroEnabled.12"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("fods", "application/vnd.oasis.opendocument.spreadsheet-flat-xml"),
    ("ots", "application/vnd.oasis.opendocument.spreadsheet-template"),
    ("csv", "text/csv"),
    // Presentations
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("pptm", "application/vnd.ms-powerpoint.presentation.macroEnabled.12"),
    ("pps", "application/vnd.ms-powerpoint"),
    (
        "ppsx",
        "application/vnd.openxmlformats-officedocument.presentationml.slideshow",
    ),
    ("ppsm", "application/vnd.ms-powerpoint.slideshow.macroEnabled.12"),
    ("pot", "application/vnd.ms-powerpoint"),
    (
        "potx",
        "application/vnd.openxmlformats-officedocument.presentationml.template",
    ),
    ("potm", "application/vnd.ms-powerpoint.template.macroEnabled.12"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("fodp", "application/vnd.oasis.opendocument.presentation-flat-xml"),
    ("otp", "application/vnd.oasis.opendocument.presentation-template"),
    // Collaboration side-artifacts
    ("json", "application/json"),
    ("zip", "application/zip"),
];

/// Returns the media type of an extension, or [`DEFAULT_MIME_TYPE`].
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    let ext = normalize_extension(ext);

    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Returns the media type of a file name, or [`DEFAULT_MIME_TYPE`].
pub fn mime_type(name: &str) -> &'static str {
    mime_type_for_extension(&extension_of(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DocumentKind;

    #[test]
    fn test_known_types() {
        assert_eq!(
            mime_type("report.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_type("data.CSV"), "text/csv");
        assert_eq!(mime_type_for_extension(".pdf"), "application/pdf");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(mime_type("photo.heic"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type("no-extension"), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_every_office_extension_has_a_type() {
        for kind in [
            DocumentKind::Text,
            DocumentKind::Spreadsheet,
            DocumentKind::Presentation,
        ] {
            for ext in kind.extensions() {
                assert_ne!(mime_type_for_extension(ext), DEFAULT_MIME_TYPE, "{ext}");
            }
        }
    }
}
