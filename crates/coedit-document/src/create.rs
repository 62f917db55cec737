//! Creation of new documents from demo content or form templates.

use coedit_core::content::ContentService;
use coedit_core::format::{mime_type, normalize_extension};
use coedit_core::types::{ArtifactId, ContainerId, NewArtifact, User};
use coedit_core::{Error, Result};

use crate::orchestrator::TEMPLATE_TARGET_EXTENSION;
use crate::{ArtifactManager, ConversionOrchestrator, DocumentConfig};

/// Tracing target for document creation.
pub const TRACING_TARGET: &str = "coedit_document::create";

/// Extensions a new document can be created with; anything else is `docx`.
pub const CREATABLE_EXTENSIONS: &[&str] = &["docx", "xlsx", "pptx", "docxf"];

/// Extension of new documents when none or an unsupported one is requested.
pub const DEFAULT_EXTENSION: &str = "docx";

/// Parameters of a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDocument {
    /// Container the document is added to.
    pub container_id: ContainerId,
    /// Name without extension; a localized default when empty.
    pub file_name: Option<String>,
    /// Requested extension.
    pub extension: Option<String>,
    /// `docx` artifact to derive a form template from (only for `docxf`).
    pub template_id: Option<ArtifactId>,
}

impl CreateDocument {
    /// Creates a request for a blank `docx` document in `container_id`.
    pub fn new(container_id: ContainerId) -> Self {
        Self {
            container_id,
            file_name: None,
            extension: None,
            template_id: None,
        }
    }

    /// Sets the name of the document, without extension.
    #[must_use]
    pub fn with_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the requested extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    /// Sets the `docx` artifact a `docxf` document is derived from.
    #[must_use]
    pub fn with_template(mut self, template_id: ArtifactId) -> Self {
        self.template_id = Some(template_id);
        self
    }
}

/// Returns the extension a new document is created with.
pub fn creatable_extension(ext: Option<&str>) -> &'static str {
    let ext = ext.map(normalize_extension).unwrap_or_default();
    CREATABLE_EXTENSIONS
        .iter()
        .copied()
        .find(|candidate| *candidate == ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Creates new documents ("create new document" in the host UI).
#[derive(Debug, Clone)]
pub struct DocumentCreator {
    manager: ArtifactManager,
    orchestrator: ConversionOrchestrator,
    content: ContentService,
    config: DocumentConfig,
}

impl DocumentCreator {
    /// Creates a new document creator.
    pub fn new(
        manager: ArtifactManager,
        orchestrator: ConversionOrchestrator,
        content: ContentService,
        config: DocumentConfig,
    ) -> Self {
        Self {
            manager,
            orchestrator,
            content,
            config,
        }
    }

    /// Creates a document and returns its artifact id.
    ///
    /// A `docxf` document with a template is derived from that template;
    /// every other document starts from the demo file of the user's locale.
    /// The name is made unique within the container.
    #[tracing::instrument(skip_all, fields(container_id = %request.container_id))]
    pub async fn create_document(
        &self,
        user: Option<&User>,
        request: CreateDocument,
    ) -> Result<ArtifactId> {
        let user = self
            .manager
            .gate()
            .require_create_access(user, request.container_id)
            .await?;

        let ext = creatable_extension(request.extension.as_deref());
        let base = request
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.content.text_or_key(&format!("document.new.{ext}")));

        let data = match request.template_id {
            Some(template_id) if ext == TEMPLATE_TARGET_EXTENSION => {
                self.orchestrator
                    .derive_form_template(Some(user), template_id)
                    .await?
            }
            _ => {
                let locale = user
                    .locale
                    .as_deref()
                    .unwrap_or(self.config.default_locale.as_str());
                let Some(data) = self.content.demo_content(Some(locale), ext) else {
                    return Err(Error::not_found()
                        .with_message(format!("no demo content for '{ext}'"))
                        .with_context(locale.to_owned()));
                };
                data
            }
        };

        let file_name = self
            .manager
            .resolve_unique_name(&base, ext, request.container_id)
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            file_name = %file_name,
            from_template = request.template_id.is_some() && ext == TEMPLATE_TARGET_EXTENSION,
            size = data.len(),
            "Creating document"
        );

        let artifact = NewArtifact::new(
            file_name.clone(),
            mime_type(&file_name),
            data,
            request.container_id,
            user.id,
        );
        self.manager.create_artifact(Some(user), artifact).await
    }
}
