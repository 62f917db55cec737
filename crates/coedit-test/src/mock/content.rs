//! Static localized content.

use std::collections::HashMap;

use bytes::Bytes;
use coedit_core::content::{DemoContentProvider, TextProvider};

/// Text lookup backed by a map.
///
/// The default instance knows the names of new documents.
#[derive(Debug, Clone)]
pub struct MockTextProvider {
    texts: HashMap<String, String>,
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::empty()
            .with_text("document.new.docx", "Document")
            .with_text("document.new.xlsx", "Spreadsheet")
            .with_text("document.new.pptx", "Presentation")
            .with_text("document.new.docxf", "Form template")
    }
}

impl MockTextProvider {
    /// Creates a lookup that knows nothing.
    pub fn empty() -> Self {
        Self {
            texts: HashMap::new(),
        }
    }

    /// Adds a text.
    #[must_use]
    pub fn with_text(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(key.into(), text.into());
        self
    }
}

impl TextProvider for MockTextProvider {
    fn text(&self, key: &str) -> Option<String> {
        self.texts.get(key).cloned()
    }
}

/// Demo document lookup backed by a map keyed by locale and extension.
///
/// The default instance has `en-US` demos for every creatable extension and a
/// `de-DE` text document.
#[derive(Debug, Clone)]
pub struct MockDemoContentProvider {
    demos: HashMap<(String, String), Bytes>,
}

impl Default for MockDemoContentProvider {
    fn default() -> Self {
        Self::empty()
            .with_demo("en-US", "docx", "demo docx en-US")
            .with_demo("en-US", "xlsx", "demo xlsx en-US")
            .with_demo("en-US", "pptx", "demo pptx en-US")
            .with_demo("en-US", "docxf", "demo docxf en-US")
            .with_demo("de-DE", "docx", "demo docx de-DE")
    }
}

impl MockDemoContentProvider {
    /// Creates a lookup without demos.
    pub fn empty() -> Self {
        Self {
            demos: HashMap::new(),
        }
    }

    /// Adds a demo document.
    #[must_use]
    pub fn with_demo(mut self, locale: &str, ext: &str, data: impl Into<Bytes>) -> Self {
        self.demos
            .insert((locale.to_owned(), ext.to_owned()), data.into());
        self
    }
}

impl DemoContentProvider for MockDemoContentProvider {
    fn demo_content(&self, locale: &str, ext: &str) -> Option<Bytes> {
        self.demos
            .get(&(locale.to_owned(), ext.to_owned()))
            .cloned()
    }
}
