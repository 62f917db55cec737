//! Mock implementations of the coedit collaborators.
//!
//! Every mock shares its state between clones, so a test keeps one handle for
//! assertions and hands another to the code under test.

mod content;
mod conversion;
mod permission;
mod storage;

use coedit_convert::{ConversionService, DownloadService};
use coedit_core::content::ContentService;
use coedit_core::permission::PermissionService;
use coedit_core::storage::StorageService;
pub use content::{MockDemoContentProvider, MockTextProvider};
pub use conversion::{MockConversionProvider, MockDownloadProvider};
pub use permission::MockPermissions;
pub use storage::{FailPoint, MockStorage};

/// A complete set of mock collaborators.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    /// Artifact storage.
    pub storage: MockStorage,
    /// Grant table.
    pub permissions: MockPermissions,
    /// Document service converter.
    pub conversion: MockConversionProvider,
    /// Result and diff downloads.
    pub downloads: MockDownloadProvider,
    /// Localized texts.
    pub text: MockTextProvider,
    /// Demo documents.
    pub demo: MockDemoContentProvider,
}

impl MockHost {
    /// Creates a host with empty storage that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage service backed by [`MockHost::storage`].
    pub fn storage_service(&self) -> StorageService {
        self.storage.service()
    }

    /// Creates a permission service backed by [`MockHost::permissions`].
    pub fn permission_service(&self) -> PermissionService {
        self.permissions.service()
    }

    /// Creates a conversion service backed by [`MockHost::conversion`].
    pub fn conversion_service(&self) -> ConversionService {
        self.conversion.service()
    }

    /// Creates a download service backed by [`MockHost::downloads`].
    pub fn download_service(&self) -> DownloadService {
        self.downloads.service()
    }

    /// Creates a content service from the static text and demo lookups.
    pub fn content_service(&self) -> ContentService {
        ContentService::new(self.text.clone(), self.demo.clone())
    }
}
