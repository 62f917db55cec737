//! Editable target formats for legacy and foreign document formats.

use super::normalize_extension;

/// Source extension to editable target extension.
const CONVERSIONS: &[(&str, &str)] = &[
    // Text documents open as docx
    ("doc", "docx"),
    ("docm", "docx"),
    ("dot", "docx"),
    ("dotx", "docx"),
    ("dotm", "docx"),
    ("odt", "docx"),
    ("fodt", "docx"),
    ("ott", "docx"),
    ("rtf", "docx"),
    ("txt", "docx"),
    ("html", "docx"),
    ("htm", "docx"),
    ("mht", "docx"),
    ("epub", "docx"),
    ("fb2", "docx"),
    // Form templates are published as fillable forms
    ("docxf", "oform"),
    // Spreadsheets open as xlsx
    ("xls", "xlsx"),
    ("xlsm", "xlsx"),
    ("xlt", "xlsx"),
    ("xltx", "xlsx"),
    ("xltm", "xlsx"),
    ("ods", "xlsx"),
    ("fods", "xlsx"),
    ("ots", "xlsx"),
    ("csv", "xlsx"),
    // Presentations open as pptx
    ("ppt", "pptx"),
    ("pptm", "pptx"),
    ("pps", "pptx"),
    ("ppsx", "pptx"),
    ("ppsm", "pptx"),
    ("pot", "pptx"),
    ("potx", "pptx"),
    ("potm", "pptx"),
    ("odp", "pptx"),
    ("fodp", "pptx"),
    ("otp", "pptx"),
];

/// Returns the extension a document of `ext` is converted to before editing.
pub fn conversion_target(ext: &str) -> Option<&'static str> {
    let ext = normalize_extension(ext);

    CONVERSIONS
        .iter()
        .find(|(source, _)| *source == ext)
        .map(|(_, target)| *target)
}

/// Returns true if [`conversion_target`] knows the extension.
pub fn is_convertible(ext: &str) -> bool {
    conversion_target(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DocumentKind;

    #[test]
    fn test_targets() {
        assert_eq!(conversion_target("odt"), Some("docx"));
        assert_eq!(conversion_target("DOCXF"), Some("oform"));
        assert_eq!(conversion_target(".ods"), Some("xlsx"));
        assert_eq!(conversion_target("ppt"), Some("pptx"));
    }

    #[test]
    fn test_editable_formats_are_not_converted() {
        assert!(!is_convertible("docx"));
        assert!(!is_convertible("xlsx"));
        assert!(!is_convertible("pptx"));
        assert!(!is_convertible("png"));
    }

    #[test]
    fn test_targets_preserve_kind() {
        for (source, target) in CONVERSIONS {
            assert_eq!(
                DocumentKind::from_extension(source),
                DocumentKind::from_extension(target),
                "{source} -> {target}"
            );
        }
    }
}
