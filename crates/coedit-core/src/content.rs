//! Localized text and demo document lookups provided by the host.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// Locale used when the user's locale has no demo content.
pub const FALLBACK_LOCALE: &str = "en-US";

/// Localized UI text lookup.
pub trait TextProvider: Send + Sync {
    /// Returns the text of `key` in the host's current language.
    fn text(&self, key: &str) -> Option<String>;
}

/// Lookup of the blank documents offered by "create new document".
pub trait DemoContentProvider: Send + Sync {
    /// Returns the blank document of extension `ext` for `locale`.
    fn demo_content(&self, locale: &str, ext: &str) -> Option<Bytes>;
}

/// Host content lookups bundled for dependency injection.
#[derive(Clone)]
pub struct ContentService {
    text: Arc<dyn TextProvider>,
    demo: Arc<dyn DemoContentProvider>,
}

impl fmt::Debug for ContentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentService").finish_non_exhaustive()
    }
}

impl ContentService {
    /// Creates a new content service.
    pub fn new<T, D>(text: T, demo: D) -> Self
    where
        T: TextProvider + 'static,
        D: DemoContentProvider + 'static,
    {
        Self {
            text: Arc::new(text),
            demo: Arc::new(demo),
        }
    }

    /// Returns the text of `key`, or the key itself when it is missing.
    pub fn text_or_key(&self, key: &str) -> String {
        self.text.text(key).unwrap_or_else(|| key.to_owned())
    }

    /// Returns the demo document for `locale`, falling back to
    /// [`FALLBACK_LOCALE`].
    pub fn demo_content(&self, locale: Option<&str>, ext: &str) -> Option<Bytes> {
        locale
            .and_then(|locale| self.demo.demo_content(locale, ext))
            .or_else(|| self.demo.demo_content(FALLBACK_LOCALE, ext))
    }
}
